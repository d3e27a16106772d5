//! # RT-cNEO Core Library
//!
//! Real-time nuclear-electronic orbital (RT-NEO) dynamics of proton transfer in the
//! bifluoride anion (FHF⁻), together with the constrained variant (RT-cNEO) that extracts
//! a smoothed, classical-like proton trajectory from the quantum dynamics.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`SimulationParameters`,
//!   `MolecularSystem`, `SimulationResults`), pure strategies for the external field and the
//!   proton potential, the energy oracle boundary, the small constraint components
//!   (smoother, history, calculator), and trajectory I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful time-stepping machinery: density-matrix
//!   propagation, numerical stability guards, the proton grid, and the `DynamicsSimulator`
//!   that advances electronic and nuclear densities in lockstep.
//!
//! - **[`workflows`]: The Public API.** Post-hoc trajectory analysis, comparison metrics and
//!   the `ComparisonStudy` that runs both methods side by side and writes a report.

pub mod core;
pub mod engine;
pub mod workflows;
