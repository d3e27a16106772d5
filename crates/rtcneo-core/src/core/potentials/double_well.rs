use super::{PotentialError, PotentialStrategy};
use crate::core::constants::{PhysicalConstants, PotentialParameters};

/// Symmetric double well `V(x) = a·x⁴ − b·x² + c·exp(−d·x²)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DoubleWellPotential {
    params: PotentialParameters,
}

impl DoubleWellPotential {
    pub fn new(params: PotentialParameters) -> Self {
        Self { params }
    }

    pub fn parameters(&self) -> &PotentialParameters {
        &self.params
    }

    #[inline]
    fn quartic_force(&self, x: f64) -> f64 {
        -4.0 * self.params.a * x.powi(3)
    }

    #[inline]
    fn quadratic_force(&self, x: f64) -> f64 {
        2.0 * self.params.b * x
    }

    #[inline]
    fn barrier_force(&self, x: f64) -> f64 {
        2.0 * self.params.c * self.params.d * x * (-self.params.d * x * x).exp()
    }

    #[inline]
    pub fn energy(&self, x: f64) -> f64 {
        let p = &self.params;
        p.a * x.powi(4) - p.b * x * x + p.c * (-p.d * x * x).exp()
    }

    #[inline]
    pub fn force(&self, x: f64) -> f64 {
        let gradient = self.quartic_force(x) + self.quadratic_force(x) + self.barrier_force(x);
        gradient * PhysicalConstants::BOHR_TO_ANGSTROM // Hartree/Å -> Hartree/bohr
    }
}

impl PotentialStrategy for DoubleWellPotential {
    fn calculate_force(&self, position: f64) -> Result<f64, PotentialError> {
        let force = self.force(position);
        if !force.is_finite() {
            return Err(PotentialError::NonFinite {
                quantity: "force",
                position,
            });
        }
        Ok(force)
    }

    fn calculate_energy(&self, position: f64) -> Result<f64, PotentialError> {
        let energy = self.energy(position);
        if !energy.is_finite() {
            return Err(PotentialError::NonFinite {
                quantity: "energy",
                position,
            });
        }
        Ok(energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn force_vanishes_at_the_barrier_top() {
        let potential = DoubleWellPotential::default();
        let force = potential.calculate_force(0.0).unwrap();
        let expected = (potential.quadratic_force(0.0) + potential.barrier_force(0.0))
            * PhysicalConstants::BOHR_TO_ANGSTROM;
        assert!(f64_approx_equal(force, expected));
        assert!(f64_approx_equal(force, 0.0));
    }

    #[test]
    fn force_is_odd_in_position() {
        let potential = DoubleWellPotential::default();
        for x in [0.05, 0.15, 0.3, 0.5, 0.9, 1.1] {
            let plus = potential.calculate_force(x).unwrap();
            let minus = potential.calculate_force(-x).unwrap();
            assert!(f64_approx_equal(plus, -minus), "x = {}", x);
        }
    }

    #[test]
    fn force_is_the_converted_negative_gradient_of_the_energy() {
        let potential = DoubleWellPotential::default();
        let h = 1e-5;
        for x in [-0.8, -0.15, 0.07, 0.4] {
            let numerical = -(potential.energy(x + h) - potential.energy(x - h)) / (2.0 * h);
            let analytic = potential.force(x) / PhysicalConstants::BOHR_TO_ANGSTROM;
            assert!((numerical - analytic).abs() < 1e-7, "x = {}", x);
        }
    }

    #[test]
    fn barrier_height_matches_parameters() {
        let potential = DoubleWellPotential::default();
        assert!(f64_approx_equal(potential.calculate_energy(0.0).unwrap(), 0.02));
        assert!(potential.energy(0.5) < potential.energy(0.0));
    }

    #[test]
    fn proton_left_of_barrier_is_pushed_further_left() {
        let potential = DoubleWellPotential::default();
        assert!(potential.calculate_force(-0.15).unwrap() < 0.0);
        assert!(potential.calculate_force(-1.0).unwrap() > 0.0);
    }
}
