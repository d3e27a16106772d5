use super::simulator::SimulatorStatus;
use crate::core::electronic::ScfError;
use crate::core::models::params::ConfigError;
use crate::core::models::state::DynamicsState;
use crate::core::models::system::SystemError;
use crate::core::oracle::OracleError;
use crate::core::potentials::PotentialError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    Electronic,
    Nuclear,
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subsystem::Electronic => f.write_str("electronic"),
            Subsystem::Nuclear => f.write_str("nuclear"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Invalid molecular system: {0}")]
    System(#[from] SystemError),

    #[error("Force evaluation failed: {0}")]
    Potential(#[from] PotentialError),

    #[error("Energy oracle failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("Initial electronic structure failed: {0}")]
    Scf(#[from] ScfError),

    #[error(
        "Numerical instability at step {step}: {subsystem} trace deviation {deviation:.3e} exceeds hard limit {limit:.3e}"
    )]
    NumericalInstability {
        step: usize,
        subsystem: Subsystem,
        deviation: f64,
        limit: f64,
        last_state: Box<DynamicsState>,
    },

    #[error("Non-finite {subsystem} Hamiltonian at step {step}")]
    NonFiniteHamiltonian {
        step: usize,
        subsystem: Subsystem,
        last_state: Box<DynamicsState>,
    },

    #[error("Simulator cannot start a run from the '{0}' state")]
    InvalidState(SimulatorStatus),
}
