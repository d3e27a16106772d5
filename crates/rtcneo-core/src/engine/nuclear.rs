use crate::core::constants::PhysicalConstants;
use crate::core::models::state::DensityMatrix;
use crate::core::potentials::{PotentialError, PotentialStrategy};
use nalgebra::{Complex, DMatrix, DVector};

/// Uniform grid for the proton between the two fluorine nuclei.
///
/// Grid points are strictly interior, so the fluorine positions act as hard walls. The
/// kinetic operator is the second-order finite-difference Laplacian in bohr.
#[derive(Debug, Clone)]
pub struct NuclearGrid {
    points: Vec<f64>,         // In Å
    points_bohr: Vec<f64>,
    spacing: f64,             // In Å
    kinetic: DMatrix<f64>,
}

impl NuclearGrid {
    pub fn new(half_distance: f64, size: usize) -> Self {
        let spacing = 2.0 * half_distance / (size as f64 + 1.0);
        let points: Vec<f64> = (1..=size)
            .map(|i| -half_distance + i as f64 * spacing)
            .collect();
        let points_bohr = points
            .iter()
            .map(|x| x * PhysicalConstants::ANGSTROM_TO_BOHR)
            .collect();

        let dx = spacing * PhysicalConstants::ANGSTROM_TO_BOHR;
        let diagonal = 1.0 / (PhysicalConstants::PROTON_MASS * dx * dx);
        let off_diagonal = -0.5 * diagonal;
        let kinetic = DMatrix::from_fn(size, size, |i, j| {
            if i == j {
                diagonal
            } else if i.abs_diff(j) == 1 {
                off_diagonal
            } else {
                0.0
            }
        });

        Self {
            points,
            points_bohr,
            spacing,
            kinetic,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn points_bohr(&self) -> &[f64] {
        &self.points_bohr
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn kinetic(&self) -> &DMatrix<f64> {
        &self.kinetic
    }

    /// Potential energy on every grid point, shifted so the minimum is zero.
    pub fn sample_surface(
        &self,
        potential: &dyn PotentialStrategy,
    ) -> Result<Vec<f64>, PotentialError> {
        let energies = self
            .points
            .iter()
            .map(|&x| potential.calculate_energy(x))
            .collect::<Result<Vec<f64>, _>>()?;
        let minimum = energies.iter().copied().fold(f64::INFINITY, f64::min);
        Ok(energies.into_iter().map(|e| e - minimum).collect())
    }

    /// `T + diag(potential)`.
    pub fn hamiltonian(&self, potential: &[f64]) -> DMatrix<f64> {
        let mut h = self.kinetic.clone();
        for (i, v) in potential.iter().enumerate() {
            h[(i, i)] += v;
        }
        h
    }

    /// `⟨x⟩` in Å.
    pub fn position_expectation(&self, density: &DensityMatrix) -> f64 {
        self.weighted_sum(density, &self.points)
    }

    /// `⟨x⟩` in bohr.
    pub fn position_expectation_bohr(&self, density: &DensityMatrix) -> f64 {
        self.weighted_sum(density, &self.points_bohr)
    }

    fn weighted_sum(&self, density: &DensityMatrix, values: &[f64]) -> f64 {
        values
            .iter()
            .enumerate()
            .map(|(i, x)| density[(i, i)].re * x)
            .sum()
    }

    /// Pure-state density of a normalized Gaussian packet centred at `center` (Å) whose
    /// probability density has standard deviation `width` (Å).
    pub fn gaussian_packet(&self, center: f64, width: f64) -> DensityMatrix {
        let amplitudes = DVector::from_iterator(
            self.len(),
            self.points
                .iter()
                .map(|x| (-(x - center).powi(2) / (4.0 * width * width)).exp()),
        );
        let psi = amplitudes.normalize().map(|a| Complex::new(a, 0.0));
        &psi * psi.adjoint()
    }
}
