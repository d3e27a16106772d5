use super::results::SimulationMode;
use crate::core::constants::DynamicsConstants;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Time step must be positive and finite, got {0}")]
    NonPositiveTimeStep(f64),

    #[error("Maximum simulation time must be positive and finite, got {0}")]
    NonPositiveMaxTime(f64),

    #[error("Maximum simulation time ({max_time}) must exceed the time step ({time_step})")]
    MaxTimeNotAfterStep { max_time: f64, time_step: f64 },

    #[error("Run of {steps:e} steps exceeds the limit of {limit} steps")]
    TooManySteps { steps: f64, limit: usize },

    #[error("Smoothing time must be positive for {mode}, got {value}")]
    NonPositiveSmoothingTime { mode: SimulationMode, value: f64 },

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Immutable configuration of one proton-transfer simulation.
///
/// Times are in atomic time units, the fluorine separation is in Å and the field strength
/// is in atomic units. The basis identifiers are passed verbatim to the energy oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub time_step: f64,
    pub max_time: f64,
    pub field_strength: f64,
    pub smoothing_time: f64,
    pub fluorine_distance: f64,
    pub basis: String,
    pub proton_basis: String,
    pub convergence_threshold: f64,
    pub max_scf_cycles: usize,
    pub use_time_dependent_fock: bool,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            time_step: 0.1,
            max_time: 500.0,
            field_strength: 0.015,
            smoothing_time: 20.0,
            fluorine_distance: 2.3,
            basis: "6-31g*".to_string(),
            proton_basis: "pb4d".to_string(),
            convergence_threshold: 1e-8,
            max_scf_cycles: 100,
            use_time_dependent_fock: false,
        }
    }
}

impl SimulationParameters {
    /// Number of steps a run performs, `ceil(max_time / time_step)`.
    ///
    /// A small tolerance absorbs the rounding of ratios such as `10.0 / 0.1`.
    pub fn step_count(&self) -> usize {
        ((self.max_time / self.time_step) - 1e-9).ceil().max(0.0) as usize
    }

    /// Validates the mode-independent invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(ConfigError::NonPositiveTimeStep(self.time_step));
        }
        if !(self.max_time.is_finite() && self.max_time > 0.0) {
            return Err(ConfigError::NonPositiveMaxTime(self.max_time));
        }
        if self.max_time <= self.time_step {
            return Err(ConfigError::MaxTimeNotAfterStep {
                max_time: self.max_time,
                time_step: self.time_step,
            });
        }
        let steps = self.max_time / self.time_step;
        if !(steps.is_finite() && steps <= DynamicsConstants::MAX_STEPS as f64) {
            return Err(ConfigError::TooManySteps {
                steps,
                limit: DynamicsConstants::MAX_STEPS,
            });
        }
        if !self.field_strength.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "field_strength",
                reason: format!("must be finite, got {}", self.field_strength),
            });
        }
        let min_distance = 2.0 * DynamicsConstants::INITIAL_PROTON_POSITION.abs();
        if !(self.fluorine_distance.is_finite() && self.fluorine_distance > min_distance) {
            return Err(ConfigError::InvalidParameter {
                name: "fluorine_distance",
                reason: format!(
                    "must exceed {:.2} Å to enclose the proton, got {}",
                    min_distance, self.fluorine_distance
                ),
            });
        }
        if !(self.convergence_threshold > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "convergence_threshold",
                reason: format!("must be positive, got {}", self.convergence_threshold),
            });
        }
        if self.max_scf_cycles == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_scf_cycles",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.basis.trim().is_empty() || self.proton_basis.trim().is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "basis",
                reason: "basis identifiers cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Validates the invariants required by a run in the given mode.
    pub fn validate_for(&self, mode: SimulationMode) -> Result<(), ConfigError> {
        self.validate()?;
        if mode == SimulationMode::RtCneo && !(self.smoothing_time > 0.0) {
            return Err(ConfigError::NonPositiveSmoothingTime {
                mode,
                value: self.smoothing_time,
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct SimulationParametersBuilder {
    time_step: Option<f64>,
    max_time: Option<f64>,
    field_strength: Option<f64>,
    smoothing_time: Option<f64>,
    fluorine_distance: Option<f64>,
    basis: Option<String>,
    proton_basis: Option<String>,
    convergence_threshold: Option<f64>,
    max_scf_cycles: Option<usize>,
    use_time_dependent_fock: Option<bool>,
}

impl SimulationParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_step(mut self, dt: f64) -> Self {
        self.time_step = Some(dt);
        self
    }
    pub fn max_time(mut self, time: f64) -> Self {
        self.max_time = Some(time);
        self
    }
    pub fn field_strength(mut self, strength: f64) -> Self {
        self.field_strength = Some(strength);
        self
    }
    pub fn smoothing_time(mut self, tau: f64) -> Self {
        self.smoothing_time = Some(tau);
        self
    }
    pub fn fluorine_distance(mut self, distance: f64) -> Self {
        self.fluorine_distance = Some(distance);
        self
    }
    pub fn basis(mut self, basis: impl Into<String>) -> Self {
        self.basis = Some(basis.into());
        self
    }
    pub fn proton_basis(mut self, basis: impl Into<String>) -> Self {
        self.proton_basis = Some(basis.into());
        self
    }
    pub fn convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = Some(threshold);
        self
    }
    pub fn max_scf_cycles(mut self, cycles: usize) -> Self {
        self.max_scf_cycles = Some(cycles);
        self
    }
    pub fn use_time_dependent_fock(mut self, enabled: bool) -> Self {
        self.use_time_dependent_fock = Some(enabled);
        self
    }

    /// Fills unset fields with their defaults and validates the result.
    pub fn build(self) -> Result<SimulationParameters, ConfigError> {
        let defaults = SimulationParameters::default();
        let params = SimulationParameters {
            time_step: self.time_step.unwrap_or(defaults.time_step),
            max_time: self.max_time.unwrap_or(defaults.max_time),
            field_strength: self.field_strength.unwrap_or(defaults.field_strength),
            smoothing_time: self.smoothing_time.unwrap_or(defaults.smoothing_time),
            fluorine_distance: self.fluorine_distance.unwrap_or(defaults.fluorine_distance),
            basis: self.basis.unwrap_or(defaults.basis),
            proton_basis: self.proton_basis.unwrap_or(defaults.proton_basis),
            convergence_threshold: self
                .convergence_threshold
                .unwrap_or(defaults.convergence_threshold),
            max_scf_cycles: self.max_scf_cycles.unwrap_or(defaults.max_scf_cycles),
            use_time_dependent_fock: self
                .use_time_dependent_fock
                .unwrap_or(defaults.use_time_dependent_fock),
        };
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_for_both_modes() {
        let params = SimulationParameters::default();
        assert!(params.validate_for(SimulationMode::RtNeo).is_ok());
        assert!(params.validate_for(SimulationMode::RtCneo).is_ok());
        assert_eq!(params.step_count(), 5000);
    }

    #[test]
    fn step_count_rounds_up_partial_steps() {
        let params = SimulationParametersBuilder::new()
            .time_step(0.1)
            .max_time(10.0)
            .build()
            .unwrap();
        assert_eq!(params.step_count(), 100);

        let params = SimulationParametersBuilder::new()
            .time_step(0.3)
            .max_time(1.0)
            .build()
            .unwrap();
        assert_eq!(params.step_count(), 4);
    }

    #[test]
    fn builder_rejects_non_positive_time_step() {
        let err = SimulationParametersBuilder::new()
            .time_step(0.0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveTimeStep(0.0));

        let err = SimulationParametersBuilder::new()
            .time_step(-0.1)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveTimeStep(_)));
    }

    #[test]
    fn builder_rejects_max_time_not_after_time_step() {
        let err = SimulationParametersBuilder::new()
            .time_step(1.0)
            .max_time(1.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MaxTimeNotAfterStep { .. }));

        let err = SimulationParametersBuilder::new()
            .max_time(-5.0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveMaxTime(-5.0));
    }

    #[test]
    fn builder_rejects_step_counts_beyond_the_limit() {
        let err = SimulationParametersBuilder::new()
            .time_step(1e-300)
            .max_time(1e300)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TooManySteps { steps, limit }
                if steps.is_infinite() && limit == DynamicsConstants::MAX_STEPS
        ));

        let err = SimulationParametersBuilder::new()
            .time_step(1e-6)
            .max_time(1e4)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::TooManySteps { .. }));

        let params = SimulationParametersBuilder::new()
            .time_step(1.0)
            .max_time(DynamicsConstants::MAX_STEPS as f64)
            .build()
            .unwrap();
        assert_eq!(params.step_count(), DynamicsConstants::MAX_STEPS);
    }

    #[test]
    fn zero_smoothing_time_is_only_rejected_in_constrained_mode() {
        let params = SimulationParametersBuilder::new()
            .smoothing_time(0.0)
            .build()
            .unwrap();
        assert!(params.validate_for(SimulationMode::RtNeo).is_ok());
        assert!(matches!(
            params.validate_for(SimulationMode::RtCneo),
            Err(ConfigError::NonPositiveSmoothingTime { value, .. }) if value == 0.0
        ));
    }

    #[test]
    fn fluorine_distance_must_enclose_the_initial_proton() {
        let err = SimulationParametersBuilder::new()
            .fluorine_distance(0.2)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter { name: "fluorine_distance", .. }
        ));
    }

    #[test]
    fn empty_basis_identifier_is_rejected() {
        let err = SimulationParametersBuilder::new()
            .basis("  ")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { name: "basis", .. }));
    }
}
