//! Mean-field model of the three-center four-electron F–H–F bond.
//!
//! The active space holds the σ orbitals of the two fluorines and the hydrogen 1s orbital,
//! occupied by four electrons. Hopping decays exponentially with the H–F distance, and an
//! on-site repulsion `U` makes the Fock matrix depend on the site populations.

use crate::core::constants::PhysicalConstants;
use crate::core::models::params::SimulationParameters;
use crate::core::models::state::DensityMatrix;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ORBITAL_COUNT: usize = 3;
pub const ACTIVE_ELECTRONS: usize = 4;
const OCCUPIED_ORBITALS: usize = ACTIVE_ELECTRONS / 2;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ScfError {
    #[error("SCF did not converge after {iterations} iterations (residual {residual:.3e})")]
    NotConverged { iterations: usize, residual: f64 },

    #[error("SCF produced a non-finite density at iteration {iteration}")]
    NonFinite { iteration: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElectronicParameters {
    pub fluorine_site_energy: f64, // In Hartree
    pub hydrogen_site_energy: f64,
    pub hopping: f64,
    pub hopping_decay: f64, // In 1/Å
    pub hubbard_u: f64,
    /// Weight of the electronic bond energy in the surface felt by the proton.
    pub vibronic_coupling: f64,
    /// Fraction of the new density mixed in per SCF iteration.
    pub scf_mixing: f64,
}

impl Default for ElectronicParameters {
    fn default() -> Self {
        Self {
            fluorine_site_energy: -0.65,
            hydrogen_site_energy: -0.50,
            hopping: -0.20,
            hopping_decay: 2.0,
            hubbard_u: 0.30,
            vibronic_coupling: 0.01,
            scf_mixing: 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScfSettings {
    pub threshold: f64,
    pub max_iterations: usize,
}

impl From<&SimulationParameters> for ScfSettings {
    fn from(params: &SimulationParameters) -> Self {
        Self {
            threshold: params.convergence_threshold,
            max_iterations: params.max_scf_cycles,
        }
    }
}

/// A converged closed-shell solution at one proton position.
#[derive(Debug, Clone)]
pub struct GroundState {
    pub density: DMatrix<f64>,
    /// The Fock matrix whose occupied orbitals span `density`.
    pub fock: DMatrix<f64>,
    pub energy: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElectronicModel {
    params: ElectronicParameters,
    half_distance: f64,
}

impl ElectronicModel {
    pub fn new(half_distance: f64) -> Self {
        Self::with_parameters(ElectronicParameters::default(), half_distance)
    }

    pub fn with_parameters(params: ElectronicParameters, half_distance: f64) -> Self {
        Self {
            params,
            half_distance,
        }
    }

    pub fn parameters(&self) -> &ElectronicParameters {
        &self.params
    }

    /// Site coordinates `[F_L, H, F_R]` in Å for a proton at `x`.
    pub fn site_positions(&self, x: f64) -> [f64; ORBITAL_COUNT] {
        [-self.half_distance, x, self.half_distance]
    }

    /// Hopping integral for an H–F separation in Å, equal to the bare value at R/2.
    pub fn hopping_at(&self, distance: f64) -> f64 {
        self.params.hopping * (-self.params.hopping_decay * (distance - self.half_distance)).exp()
    }

    fn hoppings(&self, x: f64) -> (f64, f64) {
        let left = self.hopping_at((x + self.half_distance).abs());
        let right = self.hopping_at((self.half_distance - x).abs());
        (left, right)
    }

    pub fn core_hamiltonian(&self, x: f64) -> DMatrix<f64> {
        let (left, right) = self.hoppings(x);
        let f = self.params.fluorine_site_energy;
        let h = self.params.hydrogen_site_energy;
        DMatrix::from_row_slice(
            ORBITAL_COUNT,
            ORBITAL_COUNT,
            &[f, left, 0.0, left, h, right, 0.0, right, f],
        )
    }

    /// Diagonal dipole operator in bohr. Electrons carry charge −1, so a field `E` adds
    /// `+E·x` to each site energy.
    pub fn dipole_matrix(&self, x: f64) -> DMatrix<f64> {
        let sites = self.site_positions(x).map(|s| s * PhysicalConstants::ANGSTROM_TO_BOHR);
        DMatrix::from_diagonal(&nalgebra::DVector::from_row_slice(&sites))
    }

    pub fn fock_matrix(&self, core: &DMatrix<f64>, populations: &[f64]) -> DMatrix<f64> {
        let mut fock = core.clone();
        for (i, n) in populations.iter().enumerate() {
            fock[(i, i)] += self.params.hubbard_u * n / 2.0;
        }
        fock
    }

    /// Fock matrix of a propagating density.
    pub fn fock_from_density(&self, core: &DMatrix<f64>, density: &DensityMatrix) -> DMatrix<f64> {
        let populations: Vec<f64> = (0..ORBITAL_COUNT).map(|i| density[(i, i)].re).collect();
        self.fock_matrix(core, &populations)
    }

    /// Mean-field energy `Tr(D·h) + U/4·Σ nᵢ²` of a propagating density.
    pub fn energy(&self, core: &DMatrix<f64>, density: &DensityMatrix) -> f64 {
        let one_body = crate::core::models::state::expectation_value(density, core);
        let two_body: f64 = (0..ORBITAL_COUNT)
            .map(|i| density[(i, i)].re.powi(2))
            .sum();
        one_body + self.params.hubbard_u / 4.0 * two_body
    }

    /// Electronic bond energy `2·Re(D₀₁)·β_L + 2·Re(D₁₂)·β_R` for a proton at `x`.
    pub fn bonding_energy(&self, density: &DensityMatrix, x: f64) -> f64 {
        let (left, right) = self.hoppings(x);
        2.0 * density[(0, 1)].re * left + 2.0 * density[(1, 2)].re * right
    }

    pub fn ground_state(&self, x: f64, settings: ScfSettings) -> Result<GroundState, ScfError> {
        let core = self.core_hamiltonian(x);
        let mut density = aufbau_density(&core);
        let mut residual = f64::INFINITY;

        for iteration in 1..=settings.max_iterations {
            let populations: Vec<f64> = (0..ORBITAL_COUNT).map(|i| density[(i, i)]).collect();
            let fock = self.fock_matrix(&core, &populations);
            let next = aufbau_density(&fock);

            residual = (&next - &density).amax();
            if !residual.is_finite() {
                return Err(ScfError::NonFinite { iteration });
            }
            if residual < settings.threshold {
                let energy = self.energy(&core, &crate::core::models::state::to_density(&next));
                return Ok(GroundState {
                    density: next,
                    fock,
                    energy,
                    iterations: iteration,
                });
            }
            density = &next * self.params.scf_mixing + &density * (1.0 - self.params.scf_mixing);
        }

        Err(ScfError::NotConverged {
            iterations: settings.max_iterations,
            residual,
        })
    }
}

/// Closed-shell density `2·C_occ·C_occᵀ` from the lowest orbitals of `fock`.
fn aufbau_density(fock: &DMatrix<f64>) -> DMatrix<f64> {
    let eigen = fock.clone().symmetric_eigen();
    let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

    let n = fock.nrows();
    let mut density = DMatrix::zeros(n, n);
    for &k in order.iter().take(OCCUPIED_ORBITALS) {
        let c = eigen.eigenvectors.column(k);
        density += (c * c.transpose()) * 2.0;
    }
    density
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::state::to_density;

    fn settings() -> ScfSettings {
        ScfSettings {
            threshold: 1e-8,
            max_iterations: 100,
        }
    }

    #[test]
    fn hopping_equals_bare_value_at_half_distance() {
        let model = ElectronicModel::new(1.15);
        assert!((model.hopping_at(1.15) - (-0.20)).abs() < 1e-12);
        assert!(model.hopping_at(0.9).abs() > model.hopping_at(1.4).abs());
    }

    #[test]
    fn ground_state_holds_four_electrons() {
        let model = ElectronicModel::new(1.15);
        let ground = model.ground_state(-0.15, settings()).unwrap();
        assert!((ground.density.trace() - 4.0).abs() < 1e-10);
        assert!(ground.iterations <= 100);
        assert!(ground.energy.is_finite() && ground.energy < 0.0);
    }

    #[test]
    fn ground_state_density_commutes_with_its_fock_matrix() {
        let model = ElectronicModel::new(1.15);
        let ground = model.ground_state(0.2, settings()).unwrap();
        let commutator = &ground.fock * &ground.density - &ground.density * &ground.fock;
        assert!(commutator.amax() < 1e-10);
    }

    #[test]
    fn symmetric_geometry_gives_symmetric_populations() {
        let model = ElectronicModel::new(1.15);
        let ground = model.ground_state(0.0, settings()).unwrap();
        assert!((ground.density[(0, 0)] - ground.density[(2, 2)]).abs() < 1e-7);
    }

    #[test]
    fn energy_matches_ground_state_energy() {
        let model = ElectronicModel::new(1.15);
        let ground = model.ground_state(-0.15, settings()).unwrap();
        let core = model.core_hamiltonian(-0.15);
        let recomputed = model.energy(&core, &to_density(&ground.density));
        assert!((recomputed - ground.energy).abs() < 1e-12);
    }

    #[test]
    fn zero_iterations_is_reported_as_not_converged() {
        let model = ElectronicModel::new(1.15);
        let err = model
            .ground_state(
                0.1,
                ScfSettings {
                    threshold: 1e-8,
                    max_iterations: 0,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ScfError::NotConverged { iterations: 0, .. }));
    }
}
