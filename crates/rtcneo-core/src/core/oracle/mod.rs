//! The energy-oracle boundary.
//!
//! An oracle maps a full geometry to a total energy. It stands in for an external
//! electronic-structure solver whose numerical runtime is not reentrant, so every oracle is
//! shared behind a mutex and only one evaluation runs at a time per process.

pub mod environment;
mod model;

pub use model::ModelOracle;

use crate::core::electronic::ScfError;
use crate::core::models::system::{Atom, BasisSet, MolecularSystem};
use environment::ComputeEnvironment;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum OracleError {
    #[error("Oracle has not been prepared")]
    NotPrepared,

    #[error("Basis mismatch: oracle prepared for {expected:?}, called with {found:?}")]
    BasisMismatch { expected: BasisSet, found: BasisSet },

    #[error("Oracle requires single-threaded numerics, but {0} threads were configured")]
    UnsupportedThreading(usize),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Electronic structure failed: {0}")]
    Scf(#[from] ScfError),

    #[error("Oracle lock was poisoned by a panicking evaluation")]
    Poisoned,
}

pub trait EnergyOracle: Debug + Send {
    /// Readies the oracle for geometries of `system` under the given environment.
    fn prepare(
        &mut self,
        system: &MolecularSystem,
        environment: &ComputeEnvironment,
    ) -> Result<(), OracleError>;

    fn is_prepared(&self) -> bool;

    /// Total energy in Hartree of a geometry given in Å.
    fn energy(&mut self, atoms: &[Atom], basis: &BasisSet) -> Result<f64, OracleError>;
}

pub type SharedOracle = Arc<Mutex<dyn EnergyOracle>>;

pub fn shared<O: EnergyOracle + 'static>(oracle: O) -> SharedOracle {
    Arc::new(Mutex::new(oracle))
}
