use nalgebra::{Complex, DMatrix};

/// A Hermitian density matrix over complex amplitudes.
pub type DensityMatrix = DMatrix<Complex<f64>>;

/// `Re Tr(ρ·A)` for a Hermitian density and a real symmetric operator.
pub fn expectation_value(density: &DensityMatrix, operator: &DMatrix<f64>) -> f64 {
    let n = density.nrows();
    let mut total = 0.0;
    for i in 0..n {
        for j in 0..n {
            total += density[(i, j)].re * operator[(j, i)];
        }
    }
    total
}

/// Lifts a real matrix into a complex density matrix.
pub fn to_density(matrix: &DMatrix<f64>) -> DensityMatrix {
    matrix.map(|v| Complex::new(v, 0.0))
}

/// The full dynamical state at one instant.
///
/// Cloning deep-copies both density matrices, so a clone taken as a snapshot is
/// unaffected by later steps.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicsState {
    pub time: f64,
    pub electronic_density: DensityMatrix,
    pub nuclear_density: DensityMatrix,
    pub position: f64, // In Å
    pub energy: f64,   // In Hartree
    pub constraint_force: f64,
}

impl DynamicsState {
    pub fn new(
        electronic_density: DensityMatrix,
        nuclear_density: DensityMatrix,
        position: f64,
    ) -> Self {
        Self {
            time: 0.0,
            electronic_density,
            nuclear_density,
            position,
            energy: 0.0,
            constraint_force: 0.0,
        }
    }

    pub fn electronic_population(&self) -> f64 {
        self.electronic_density.trace().re
    }

    pub fn nuclear_population(&self) -> f64 {
        self.nuclear_density.trace().re
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expectation_value_is_the_real_trace_product() {
        let density = to_density(&DMatrix::from_row_slice(2, 2, &[0.75, 0.25, 0.25, 0.25]));
        let operator = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, -1.0]);
        assert!((expectation_value(&density, &operator) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn clone_is_independent_of_the_original() {
        let mut state = DynamicsState::new(
            DensityMatrix::identity(3, 3),
            DensityMatrix::identity(2, 2),
            -0.15,
        );
        let snapshot = state.clone();
        state.electronic_density[(0, 0)] = Complex::new(5.0, 0.0);
        state.position = 0.2;

        assert_eq!(snapshot.electronic_density[(0, 0)], Complex::new(1.0, 0.0));
        assert_eq!(snapshot.position, -0.15);
        assert!((snapshot.electronic_population() - 3.0).abs() < 1e-12);
        assert!((snapshot.nuclear_population() - 2.0).abs() < 1e-12);
    }
}
