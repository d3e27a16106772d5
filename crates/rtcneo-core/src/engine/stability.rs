use crate::core::constants::NumericalSettings;
use crate::core::models::state::DensityMatrix;
use nalgebra::Complex;
use tracing::warn;

/// A trace deviation beyond the hard limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceViolation {
    pub deviation: f64,
    pub limit: f64,
}

/// Keeps one propagated density physical.
///
/// Each call checks the trace against the expected particle count, floors the eigenvalues
/// and renormalizes the trace. Deviations above the soft tolerance are logged and counted;
/// deviations above `tolerance × hard_tolerance_ratio`, or a non-finite trace, are returned
/// as a [`TraceViolation`] and leave the density untouched.
#[derive(Debug, Clone)]
pub struct StabilityGuard {
    label: &'static str,
    expected_trace: f64,
    eigenvalue_floor: f64,
    tolerance: f64,
    hard_limit: f64,
    soft_violations: usize,
    floored_eigenvalues: usize,
    max_deviation: f64,
}

impl StabilityGuard {
    pub fn new(label: &'static str, expected_trace: f64, settings: &NumericalSettings) -> Self {
        Self {
            label,
            expected_trace,
            eigenvalue_floor: settings.eigenvalue_floor,
            tolerance: settings.trace_tolerance,
            hard_limit: settings.hard_trace_tolerance(),
            soft_violations: 0,
            floored_eigenvalues: 0,
            max_deviation: 0.0,
        }
    }

    pub fn soft_violations(&self) -> usize {
        self.soft_violations
    }

    pub fn floored_eigenvalues(&self) -> usize {
        self.floored_eigenvalues
    }

    pub fn max_deviation(&self) -> f64 {
        self.max_deviation
    }

    pub fn enforce(&mut self, density: &mut DensityMatrix) -> Result<(), TraceViolation> {
        let deviation = (density.trace().re - self.expected_trace).abs();
        if !deviation.is_finite() || deviation > self.hard_limit {
            return Err(TraceViolation {
                deviation,
                limit: self.hard_limit,
            });
        }
        self.max_deviation = self.max_deviation.max(deviation);
        if deviation > self.tolerance {
            self.soft_violations += 1;
            warn!(
                density = self.label,
                deviation,
                tolerance = self.tolerance,
                "Trace deviation above tolerance; renormalizing"
            );
        }

        let mut eigen = density.clone().symmetric_eigen();
        let mut floored = 0;
        for value in eigen.eigenvalues.iter_mut() {
            if *value < self.eigenvalue_floor {
                *value = self.eigenvalue_floor;
                floored += 1;
            }
        }
        if floored > 0 {
            self.floored_eigenvalues += floored;
            *density = eigen.recompose();
        }

        let trace = density.trace().re;
        if trace > 0.0 {
            *density *= Complex::new(self.expected_trace / trace, 0.0);
        }
        Ok(())
    }
}
