//! # Core Module
//!
//! Stateless building blocks of the proton-transfer dynamics.
//!
//! - **Constants** ([`constants`]) - Physical constants, model potential parameters and
//!   numerical settings shared across the crate
//! - **Data Models** ([`models`]) - Simulation parameters, the FHF⁻ system, per-step state
//!   and complete trajectories
//! - **External Field** ([`fields`]) - Time-dependent field strategies
//! - **Proton Potential** ([`potentials`]) - Analytic and oracle-backed force strategies
//! - **Electronic Structure** ([`electronic`]) - Three-center mean-field model of the F–H–F bond
//! - **Energy Oracle** ([`oracle`]) - The energy boundary and process-wide compute environment
//! - **Constraint** ([`constraint`]) - Force smoothing, history and the constraint force
//! - **File I/O** ([`io`]) - Trajectory tables

pub mod constants;
pub mod constraint;
pub mod electronic;
pub mod fields;
pub mod io;
pub mod models;
pub mod oracle;
pub mod potentials;
