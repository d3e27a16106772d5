use super::{GradientStatistics, PotentialError, PotentialStrategy};
use crate::core::constants::{DynamicsConstants, PhysicalConstants};
use crate::core::models::system::MolecularSystem;
use crate::core::oracle::{EnergyOracle, OracleError, SharedOracle};
use std::sync::MutexGuard;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

/// Centered finite-difference force over an external energy oracle.
///
/// Only the proton is displaced; the fluorine nuclei of the template geometry stay fixed.
/// The oracle lock is held for both displaced evaluations of one force, so a force is never
/// interleaved with another caller's evaluations.
#[derive(Debug)]
pub struct NumericalGradientPotential {
    oracle: SharedOracle,
    template: MolecularSystem,
    step_size: f64, // In Å
    gradient_calls: AtomicUsize,
    gradient_evaluations: AtomicUsize,
    energy_evaluations: AtomicUsize,
}

impl NumericalGradientPotential {
    pub fn new(oracle: SharedOracle, template: MolecularSystem) -> Self {
        Self::with_step_size(oracle, template, DynamicsConstants::FINITE_DIFFERENCE_STEP)
    }

    pub fn with_step_size(
        oracle: SharedOracle,
        template: MolecularSystem,
        step_size: f64,
    ) -> Self {
        Self {
            oracle,
            template,
            step_size,
            gradient_calls: AtomicUsize::new(0),
            gradient_evaluations: AtomicUsize::new(0),
            energy_evaluations: AtomicUsize::new(0),
        }
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    fn prepared_oracle(
        &self,
    ) -> Result<MutexGuard<'_, dyn EnergyOracle + 'static>, PotentialError> {
        let guard = self.oracle.lock().map_err(|_| OracleError::Poisoned)?;
        if !guard.is_prepared() {
            return Err(PotentialError::OracleUnavailable);
        }
        Ok(guard)
    }

    fn energy_at(
        &self,
        oracle: &mut (dyn EnergyOracle + 'static),
        x: f64,
    ) -> Result<f64, PotentialError> {
        let geometry = self.template.geometry_with_proton_at(x);
        let energy = oracle.energy(&geometry, self.template.basis())?;
        self.energy_evaluations.fetch_add(1, Ordering::Relaxed);
        if !energy.is_finite() {
            return Err(PotentialError::NonFinite {
                quantity: "energy",
                position: x,
            });
        }
        Ok(energy)
    }
}

impl PotentialStrategy for NumericalGradientPotential {
    fn calculate_force(&self, position: f64) -> Result<f64, PotentialError> {
        let mut oracle = self.prepared_oracle()?;
        let e_plus = self.energy_at(&mut *oracle, position + self.step_size)?;
        let e_minus = self.energy_at(&mut *oracle, position - self.step_size)?;
        drop(oracle);

        self.gradient_calls.fetch_add(1, Ordering::Relaxed);
        self.gradient_evaluations.fetch_add(2, Ordering::Relaxed);
        let force = -(e_plus - e_minus) / (2.0 * self.step_size);
        trace!(position, force, "Numerical gradient evaluated");
        Ok(force * PhysicalConstants::BOHR_TO_ANGSTROM) // Hartree/Å -> Hartree/bohr
    }

    fn calculate_energy(&self, position: f64) -> Result<f64, PotentialError> {
        let mut oracle = self.prepared_oracle()?;
        self.energy_at(&mut *oracle, position)
    }

    fn statistics(&self) -> Option<GradientStatistics> {
        let gradient_calls = self.gradient_calls.load(Ordering::Relaxed);
        let gradient_evaluations = self.gradient_evaluations.load(Ordering::Relaxed);
        let energy_evaluations = self.energy_evaluations.load(Ordering::Relaxed);
        let average_evaluations_per_gradient = if gradient_calls > 0 {
            gradient_evaluations as f64 / gradient_calls as f64
        } else {
            0.0
        };
        Some(GradientStatistics {
            gradient_calls,
            energy_evaluations,
            average_evaluations_per_gradient,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::PotentialParameters;
    use crate::core::models::params::SimulationParameters;
    use crate::core::oracle::environment::ComputeEnvironment;
    use crate::core::oracle::{ModelOracle, shared};
    use crate::core::potentials::DoubleWellPotential;
    use crate::core::electronic::{ElectronicParameters, ScfSettings};

    fn bare_double_well_oracle() -> ModelOracle {
        let electronic = ElectronicParameters {
            vibronic_coupling: 0.0,
            ..ElectronicParameters::default()
        };
        ModelOracle::with_parameters(
            PotentialParameters::default(),
            electronic,
            ScfSettings::from(&SimulationParameters::default()),
        )
    }

    fn system() -> MolecularSystem {
        MolecularSystem::bifluoride(&SimulationParameters::default()).unwrap()
    }

    #[test]
    fn unprepared_oracle_is_reported_as_unavailable() {
        let potential =
            NumericalGradientPotential::new(shared(bare_double_well_oracle()), system());
        assert!(matches!(
            potential.calculate_force(0.1),
            Err(PotentialError::OracleUnavailable)
        ));
        assert!(matches!(
            potential.calculate_energy(0.1),
            Err(PotentialError::OracleUnavailable)
        ));
    }

    #[test]
    fn numerical_force_matches_analytic_double_well() {
        let system = system();
        let mut oracle = bare_double_well_oracle();
        oracle
            .prepare(&system, &ComputeEnvironment::default())
            .unwrap();
        let potential = NumericalGradientPotential::new(shared(oracle), system);
        let analytic = DoubleWellPotential::default();

        for x in [-0.6, -0.15, 0.0, 0.3] {
            let numerical = potential.calculate_force(x).unwrap();
            let exact = analytic.calculate_force(x).unwrap();
            assert!((numerical - exact).abs() < 1e-5, "x = {}", x);
        }
    }

    #[test]
    fn statistics_count_two_evaluations_per_gradient() {
        let system = system();
        let mut oracle = bare_double_well_oracle();
        oracle
            .prepare(&system, &ComputeEnvironment::default())
            .unwrap();
        let potential = NumericalGradientPotential::new(shared(oracle), system);

        assert_eq!(
            potential.statistics().unwrap().average_evaluations_per_gradient,
            0.0
        );
        for x in [-0.2, 0.0, 0.2] {
            potential.calculate_force(x).unwrap();
        }
        let stats = potential.statistics().unwrap();
        assert_eq!(stats.gradient_calls, 3);
        assert_eq!(stats.energy_evaluations, 6);
        assert!((stats.average_evaluations_per_gradient - 2.0).abs() < 1e-12);
    }

    #[test]
    fn energy_samples_are_counted_but_not_averaged_into_gradients() {
        let system = system();
        let mut oracle = bare_double_well_oracle();
        oracle
            .prepare(&system, &ComputeEnvironment::default())
            .unwrap();
        let potential = NumericalGradientPotential::new(shared(oracle), system);

        for i in 0..10 {
            potential.calculate_energy(-0.5 + 0.1 * i as f64).unwrap();
        }
        for x in [-0.1, 0.1] {
            potential.calculate_force(x).unwrap();
        }
        let stats = potential.statistics().unwrap();
        assert_eq!(stats.gradient_calls, 2);
        assert_eq!(stats.energy_evaluations, 14);
        assert!((stats.average_evaluations_per_gradient - 2.0).abs() < 1e-12);
    }
}
