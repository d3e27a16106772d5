//! Proton force strategies.
//!
//! Positions come in Å. Forces are always returned in Hartree/bohr, so every strategy
//! multiplies its Hartree/Å gradient by the number of Å per bohr before returning.

mod double_well;
mod numerical;

pub use double_well::DoubleWellPotential;
pub use numerical::NumericalGradientPotential;

use crate::core::oracle::OracleError;
use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PotentialError {
    #[error("Energy oracle has not been prepared for this system")]
    OracleUnavailable,

    #[error("Energy oracle failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("Non-finite {quantity} at proton position {position} Å")]
    NonFinite {
        quantity: &'static str,
        position: f64,
    },
}

/// Call counters of an oracle-backed strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStatistics {
    pub gradient_calls: usize,
    /// Every oracle evaluation, including single-point energies such as surface samples.
    pub energy_evaluations: usize,
    /// Oracle evaluations per force, excluding single-point energies.
    pub average_evaluations_per_gradient: f64,
}

pub trait PotentialStrategy: Debug + Send {
    /// Force on the proton, `−dV/dx`, in Hartree/bohr for a position in Å.
    fn calculate_force(&self, position: f64) -> Result<f64, PotentialError>;

    /// Potential energy in Hartree for a position in Å.
    fn calculate_energy(&self, position: f64) -> Result<f64, PotentialError>;

    fn statistics(&self) -> Option<GradientStatistics> {
        None
    }
}
