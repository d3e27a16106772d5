use super::environment::ComputeEnvironment;
use super::{EnergyOracle, OracleError};
use crate::core::constants::PotentialParameters;
use crate::core::electronic::{ElectronicModel, ElectronicParameters, ScfSettings};
use crate::core::models::system::{Atom, BasisSet, Element, MolecularSystem, NucleusKind};
use crate::core::potentials::DoubleWellPotential;
use tracing::debug;

/// Total energy of FHF⁻ near its equilibrium geometry, in Hartree.
const REFERENCE_ENERGY: f64 = -199.5;

/// Analytic stand-in for an ab initio solver.
///
/// The energy is a reference offset plus the double-well proton surface plus the
/// vibronically weighted energy of the three-center electronic model at the same geometry.
#[derive(Debug)]
pub struct ModelOracle {
    surface: DoubleWellPotential,
    electronic: ElectronicParameters,
    scf: ScfSettings,
    prepared_basis: Option<BasisSet>,
    evaluations: usize,
}

impl ModelOracle {
    pub fn new(scf: ScfSettings) -> Self {
        Self::with_parameters(PotentialParameters::default(), ElectronicParameters::default(), scf)
    }

    pub fn with_parameters(
        surface: PotentialParameters,
        electronic: ElectronicParameters,
        scf: ScfSettings,
    ) -> Self {
        Self {
            surface: DoubleWellPotential::new(surface),
            electronic,
            scf,
            prepared_basis: None,
            evaluations: 0,
        }
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    fn proton_and_half_distance(atoms: &[Atom]) -> Result<(f64, f64), OracleError> {
        let proton = atoms
            .iter()
            .find(|a| a.kind == NucleusKind::Quantum)
            .ok_or_else(|| OracleError::InvalidGeometry("no quantum nucleus".to_string()))?;
        let fluorines: Vec<f64> = atoms
            .iter()
            .filter(|a| a.element == Element::F)
            .map(|a| a.position.x)
            .collect();
        if fluorines.len() != 2 {
            return Err(OracleError::InvalidGeometry(format!(
                "expected 2 fluorine atoms, found {}",
                fluorines.len()
            )));
        }
        let half_distance = (fluorines[1] - fluorines[0]).abs() / 2.0;
        Ok((proton.position.x, half_distance))
    }
}

impl EnergyOracle for ModelOracle {
    fn prepare(
        &mut self,
        system: &MolecularSystem,
        environment: &ComputeEnvironment,
    ) -> Result<(), OracleError> {
        if environment.oracle_threads != 1 {
            return Err(OracleError::UnsupportedThreading(environment.oracle_threads));
        }
        debug!(
            basis = %system.basis().electronic,
            proton_basis = %system.basis().nuclear,
            "Preparing model oracle"
        );
        self.prepared_basis = Some(system.basis().clone());
        Ok(())
    }

    fn is_prepared(&self) -> bool {
        self.prepared_basis.is_some()
    }

    fn energy(&mut self, atoms: &[Atom], basis: &BasisSet) -> Result<f64, OracleError> {
        let prepared = self.prepared_basis.as_ref().ok_or(OracleError::NotPrepared)?;
        if prepared != basis {
            return Err(OracleError::BasisMismatch {
                expected: prepared.clone(),
                found: basis.clone(),
            });
        }

        let (x, half_distance) = Self::proton_and_half_distance(atoms)?;
        let mut energy = REFERENCE_ENERGY + self.surface.energy(x);
        if self.electronic.vibronic_coupling != 0.0 {
            let model = ElectronicModel::with_parameters(self.electronic, half_distance);
            let ground = model.ground_state(x, self.scf)?;
            energy += self.electronic.vibronic_coupling * ground.energy;
        }
        self.evaluations += 1;
        Ok(energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::params::SimulationParameters;

    fn system() -> MolecularSystem {
        MolecularSystem::bifluoride(&SimulationParameters::default()).unwrap()
    }

    fn oracle() -> ModelOracle {
        ModelOracle::new(ScfSettings::from(&SimulationParameters::default()))
    }

    #[test]
    fn energy_requires_preparation() {
        let system = system();
        let mut oracle = oracle();
        assert!(!oracle.is_prepared());
        assert_eq!(
            oracle.energy(system.atoms(), system.basis()),
            Err(OracleError::NotPrepared)
        );
    }

    #[test]
    fn prepared_oracle_returns_energy_near_reference() {
        let system = system();
        let mut oracle = oracle();
        oracle
            .prepare(&system, &ComputeEnvironment::default())
            .unwrap();
        let energy = oracle.energy(system.atoms(), system.basis()).unwrap();
        assert!((energy - REFERENCE_ENERGY).abs() < 0.1);
        assert_eq!(oracle.evaluations(), 1);
    }

    #[test]
    fn mismatched_basis_is_rejected() {
        let system = system();
        let mut oracle = oracle();
        oracle
            .prepare(&system, &ComputeEnvironment::default())
            .unwrap();
        let other = BasisSet {
            electronic: "sto-3g".to_string(),
            nuclear: "pb4d".to_string(),
        };
        assert!(matches!(
            oracle.energy(system.atoms(), &other),
            Err(OracleError::BasisMismatch { .. })
        ));
    }

    #[test]
    fn multithreaded_environment_is_rejected() {
        let mut oracle = oracle();
        let environment = ComputeEnvironment {
            worker_threads: None,
            oracle_threads: 4,
        };
        assert_eq!(
            oracle.prepare(&system(), &environment),
            Err(OracleError::UnsupportedThreading(4))
        );
        assert!(!oracle.is_prepared());
    }

    #[test]
    fn energy_is_symmetric_under_proton_reflection() {
        let system = system();
        let mut oracle = oracle();
        oracle
            .prepare(&system, &ComputeEnvironment::default())
            .unwrap();
        let left = oracle
            .energy(&system.geometry_with_proton_at(-0.4), system.basis())
            .unwrap();
        let right = oracle
            .energy(&system.geometry_with_proton_at(0.4), system.basis())
            .unwrap();
        assert!((left - right).abs() < 1e-8);
    }
}
