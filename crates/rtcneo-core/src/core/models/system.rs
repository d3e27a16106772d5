use super::params::SimulationParameters;
use crate::core::constants::DynamicsConstants;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const FHF_CHARGE: i32 = -1;
const FHF_ELECTRON_COUNT: i32 = 20;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SystemError {
    #[error("Expected {expected} electrons, but the geometry and charge give {found}")]
    ElectronCount { expected: i32, found: i32 },

    #[error("System must contain exactly one quantum nucleus, found {0}")]
    QuantumNucleusCount(usize),

    #[error("System must contain two classical fluorine nuclei")]
    MissingFluorine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    H,
    F,
}

impl Element {
    pub fn atomic_number(&self) -> i32 {
        match self {
            Element::H => 1,
            Element::F => 9,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::F => "F",
        }
    }
}

/// Whether a nucleus is held fixed as a point charge or treated quantum mechanically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NucleusKind {
    Classical,
    Quantum,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: Element,
    pub position: Point3<f64>, // In Å
    pub kind: NucleusKind,
}

impl Atom {
    pub fn new(element: Element, position: Point3<f64>, kind: NucleusKind) -> Self {
        Self {
            element,
            position,
            kind,
        }
    }
}

/// Opaque basis-set identifiers handed to the energy oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasisSet {
    pub electronic: String,
    pub nuclear: String,
}

/// The FHF⁻ anion laid out along the x axis.
///
/// The fluorine nuclei sit at `∓R/2` and the proton, the only quantum nucleus, is stored
/// last. Positions are in Å.
#[derive(Debug, Clone, PartialEq)]
pub struct MolecularSystem {
    atoms: Vec<Atom>,
    charge: i32,
    basis: BasisSet,
    proton_index: usize,
}

impl MolecularSystem {
    pub fn bifluoride(params: &SimulationParameters) -> Result<Self, SystemError> {
        let half = params.fluorine_distance / 2.0;
        let atoms = vec![
            Atom::new(
                Element::F,
                Point3::new(-half, 0.0, 0.0),
                NucleusKind::Classical,
            ),
            Atom::new(Element::F, Point3::new(half, 0.0, 0.0), NucleusKind::Classical),
            Atom::new(
                Element::H,
                Point3::new(DynamicsConstants::INITIAL_PROTON_POSITION, 0.0, 0.0),
                NucleusKind::Quantum,
            ),
        ];
        let basis = BasisSet {
            electronic: params.basis.clone(),
            nuclear: params.proton_basis.clone(),
        };
        Self::from_atoms(atoms, FHF_CHARGE, basis)
    }

    pub fn from_atoms(atoms: Vec<Atom>, charge: i32, basis: BasisSet) -> Result<Self, SystemError> {
        let quantum: Vec<usize> = atoms
            .iter()
            .enumerate()
            .filter(|(_, a)| a.kind == NucleusKind::Quantum)
            .map(|(i, _)| i)
            .collect();
        if quantum.len() != 1 {
            return Err(SystemError::QuantumNucleusCount(quantum.len()));
        }
        let fluorines = atoms
            .iter()
            .filter(|a| a.element == Element::F && a.kind == NucleusKind::Classical)
            .count();
        if fluorines != 2 {
            return Err(SystemError::MissingFluorine);
        }

        let system = Self {
            atoms,
            charge,
            basis,
            proton_index: quantum[0],
        };
        let found = system.electron_count();
        if found != FHF_ELECTRON_COUNT {
            return Err(SystemError::ElectronCount {
                expected: FHF_ELECTRON_COUNT,
                found,
            });
        }
        Ok(system)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    pub fn basis(&self) -> &BasisSet {
        &self.basis
    }

    pub fn proton_index(&self) -> usize {
        self.proton_index
    }

    pub fn proton_position(&self) -> f64 {
        self.atoms[self.proton_index].position.x
    }

    pub fn electron_count(&self) -> i32 {
        self.atoms
            .iter()
            .map(|a| a.element.atomic_number())
            .sum::<i32>()
            - self.charge
    }

    /// Positions of the two fluorine nuclei along the axis, left first.
    pub fn fluorine_positions(&self) -> (f64, f64) {
        let mut xs = self
            .atoms
            .iter()
            .filter(|a| a.element == Element::F)
            .map(|a| a.position.x);
        let first = xs.next().unwrap_or_default();
        let second = xs.next().unwrap_or_default();
        (first.min(second), first.max(second))
    }

    pub fn fluorine_distance(&self) -> f64 {
        let (left, right) = self.fluorine_positions();
        right - left
    }

    /// Half of the F–F separation, the reach of the proton box.
    pub fn half_distance(&self) -> f64 {
        self.fluorine_distance() / 2.0
    }

    /// A copy of the geometry with only the proton moved to `x` on the axis.
    pub fn geometry_with_proton_at(&self, x: f64) -> Vec<Atom> {
        let mut atoms = self.atoms.clone();
        atoms[self.proton_index].position = Point3::new(x, 0.0, 0.0);
        atoms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bifluoride_places_fluorines_symmetrically() {
        let system = MolecularSystem::bifluoride(&SimulationParameters::default()).unwrap();
        let (left, right) = system.fluorine_positions();
        assert!((left + 1.15).abs() < 1e-12);
        assert!((right - 1.15).abs() < 1e-12);
        assert!((system.half_distance() - 1.15).abs() < 1e-12);
        assert_eq!(system.proton_index(), 2);
        assert!((system.proton_position() + 0.15).abs() < 1e-12);
    }

    #[test]
    fn bifluoride_has_twenty_electrons() {
        let system = MolecularSystem::bifluoride(&SimulationParameters::default()).unwrap();
        assert_eq!(system.charge(), -1);
        assert_eq!(system.electron_count(), 20);
    }

    #[test]
    fn wrong_charge_is_rejected() {
        let system = MolecularSystem::bifluoride(&SimulationParameters::default()).unwrap();
        let err = MolecularSystem::from_atoms(system.atoms().to_vec(), 0, system.basis().clone())
            .unwrap_err();
        assert_eq!(
            err,
            SystemError::ElectronCount {
                expected: 20,
                found: 19
            }
        );
    }

    #[test]
    fn displaced_geometry_only_moves_the_proton() {
        let system = MolecularSystem::bifluoride(&SimulationParameters::default()).unwrap();
        let moved = system.geometry_with_proton_at(0.4);
        assert_eq!(moved[0], system.atoms()[0]);
        assert_eq!(moved[1], system.atoms()[1]);
        assert!((moved[2].position.x - 0.4).abs() < 1e-12);
        assert!((system.proton_position() + 0.15).abs() < 1e-12);
    }
}
