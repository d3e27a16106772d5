//! # Engine Module
//!
//! The stateful time-stepping machinery of RT-NEO and RT-cNEO dynamics.
//!
//! ## Architecture
//!
//! - **Simulation** ([`simulator`]) - The `DynamicsSimulator` state machine and its step loop
//! - **Assembly** ([`factory`]) - Builds simulators from parameters and strategy configs
//! - **Proton Grid** ([`nuclear`]) - Discretized proton Hamiltonian and observables
//! - **Propagation** ([`propagation`]) - Unitary density-matrix propagators
//! - **Stability** ([`stability`]) - Trace and eigenvalue guards on propagated densities
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod error;
pub mod factory;
pub mod nuclear;
pub mod progress;
pub(crate) mod propagation;
pub mod simulator;
pub mod stability;
