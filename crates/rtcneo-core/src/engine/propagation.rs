use crate::core::models::state::DensityMatrix;
use nalgebra::{Complex, DMatrix, DVector};

const MAX_EIGEN_ITERATIONS: usize = 10_000;

/// `exp(−i·H·dt)` for a real symmetric Hamiltonian, built from its eigendecomposition.
///
/// Returns `None` for a non-finite Hamiltonian or when the eigensolver does not converge.
pub fn unitary(hamiltonian: &DMatrix<f64>, time_step: f64) -> Option<DensityMatrix> {
    if !hamiltonian.iter().all(|v| v.is_finite()) || !time_step.is_finite() {
        return None;
    }
    let n = hamiltonian.nrows();
    let eigen = hamiltonian
        .clone()
        .try_symmetric_eigen(f64::EPSILON, MAX_EIGEN_ITERATIONS)?;
    let q = eigen.eigenvectors.map(|v| Complex::new(v, 0.0));
    let phases = DVector::from_iterator(
        n,
        eigen
            .eigenvalues
            .iter()
            .map(|&lambda| Complex::from_polar(1.0, -lambda * time_step)),
    );
    Some(&q * DMatrix::from_diagonal(&phases) * q.transpose())
}

/// `U·ρ·U†`.
pub fn evolve(density: &DensityMatrix, unitary: &DensityMatrix) -> DensityMatrix {
    unitary * density * unitary.adjoint()
}

#[derive(Debug)]
struct CachedPropagator {
    hamiltonian: DMatrix<f64>,
    time_step: f64,
    unitary: DensityMatrix,
}

/// Reuses the last propagator while the Hamiltonian and time step are unchanged.
#[derive(Debug, Default)]
pub struct PropagatorCache {
    cached: Option<CachedPropagator>,
    builds: usize,
}

impl PropagatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn propagator(
        &mut self,
        hamiltonian: &DMatrix<f64>,
        time_step: f64,
    ) -> Option<&DensityMatrix> {
        let fresh = self
            .cached
            .as_ref()
            .is_none_or(|c| c.time_step != time_step || &c.hamiltonian != hamiltonian);
        if fresh {
            self.cached = Some(CachedPropagator {
                hamiltonian: hamiltonian.clone(),
                time_step,
                unitary: unitary(hamiltonian, time_step)?,
            });
            self.builds += 1;
        }
        self.cached.as_ref().map(|c| &c.unitary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::state::{expectation_value, to_density};

    fn hamiltonian() -> DMatrix<f64> {
        DMatrix::from_row_slice(3, 3, &[-0.65, -0.2, 0.0, -0.2, -0.5, -0.1, 0.0, -0.1, -0.6])
    }

    fn mixed_density() -> DensityMatrix {
        to_density(&DMatrix::from_row_slice(
            3,
            3,
            &[0.5, 0.2, 0.1, 0.2, 0.3, 0.0, 0.1, 0.0, 0.2],
        ))
    }

    #[test]
    fn unitary_is_unitary() {
        let u = unitary(&hamiltonian(), 0.7).unwrap();
        let product = &u * u.adjoint();
        let identity = DensityMatrix::identity(3, 3);
        assert!((product - identity).norm() < 1e-13);
    }

    #[test]
    fn evolution_preserves_trace_hermiticity_and_energy() {
        let h = hamiltonian();
        let rho = mixed_density();
        let evolved = evolve(&rho, &unitary(&h, 1.3).unwrap());

        assert!((evolved.trace().re - rho.trace().re).abs() < 1e-13);
        assert!((&evolved - evolved.adjoint()).norm() < 1e-13);
        assert!((expectation_value(&evolved, &h) - expectation_value(&rho, &h)).abs() < 1e-13);
    }

    #[test]
    fn zero_time_step_is_the_identity() {
        let u = unitary(&hamiltonian(), 0.0).unwrap();
        assert!((u - DensityMatrix::identity(3, 3)).norm() < 1e-13);
    }

    #[test]
    fn cache_rebuilds_only_when_hamiltonian_changes() {
        let mut cache = PropagatorCache::new();
        let h = hamiltonian();
        assert!(cache.propagator(&h, 0.1).is_some());
        assert!(cache.propagator(&h, 0.1).is_some());
        assert_eq!(cache.builds(), 1);

        let mut shifted = h.clone();
        shifted[(0, 0)] += 1e-3;
        cache.propagator(&shifted, 0.1);
        assert_eq!(cache.builds(), 2);

        cache.propagator(&shifted, 0.2);
        assert_eq!(cache.builds(), 3);
    }

    #[test]
    fn non_finite_hamiltonian_has_no_propagator() {
        let mut h = hamiltonian();
        h[(1, 1)] = f64::NAN;
        assert!(unitary(&h, 0.1).is_none());

        let mut cache = PropagatorCache::new();
        assert!(cache.propagator(&h, 0.1).is_none());
        assert_eq!(cache.builds(), 0);
    }
}
