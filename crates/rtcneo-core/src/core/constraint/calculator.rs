use super::{ForceHistory, ForceSmoother};
use crate::core::constants::DynamicsConstants;
use crate::core::potentials::{PotentialError, PotentialStrategy};

/// Produces the RT-cNEO feedback force `multiplier·(smoothed − quantum)`.
#[derive(Debug)]
pub struct ConstraintForceCalculator {
    potential: Box<dyn PotentialStrategy>,
    smoother: ForceSmoother,
    history: ForceHistory,
    multiplier: f64,
}

impl ConstraintForceCalculator {
    pub fn new(potential: Box<dyn PotentialStrategy>, smoothing_time: f64) -> Self {
        Self::with_multiplier(
            potential,
            smoothing_time,
            DynamicsConstants::CONSTRAINT_FORCE_MULTIPLIER,
        )
    }

    pub fn with_multiplier(
        potential: Box<dyn PotentialStrategy>,
        smoothing_time: f64,
        multiplier: f64,
    ) -> Self {
        Self {
            potential,
            smoother: ForceSmoother::new(smoothing_time),
            history: ForceHistory::default(),
            multiplier,
        }
    }

    pub fn potential(&self) -> &dyn PotentialStrategy {
        self.potential.as_ref()
    }

    pub fn history(&self) -> &ForceHistory {
        &self.history
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Returns `(quantum_force, constraint_force)` for the proton at `position` (Å).
    pub fn calculate_constraint_force(
        &mut self,
        position: f64,
        time_step: f64,
    ) -> Result<(f64, f64), PotentialError> {
        let quantum_force = self.potential.calculate_force(position)?;
        let smoothed_force = self.smoother.smooth(quantum_force, time_step);
        let constraint_force = self.multiplier * (smoothed_force - quantum_force);
        self.history.append(smoothed_force);
        Ok((quantum_force, constraint_force))
    }

    pub fn reset(&mut self) {
        self.smoother.reset();
        self.history.clear();
    }
}
