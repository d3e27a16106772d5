//! External electric field strategies.
//!
//! Every strategy is a pure function of time. None of them keeps history, so the
//! integrator may evaluate them at arbitrary, non-grid-aligned times.

use crate::core::constants::DynamicsConstants;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt::Debug;

pub trait FieldStrategy: Debug + Send + Sync {
    /// Field amplitude in atomic units at `time` (atomic time units).
    fn calculate_field(&self, time: f64) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantField {
    pub strength: f64,
}

impl FieldStrategy for ConstantField {
    fn calculate_field(&self, _time: f64) -> f64 {
        self.strength
    }
}

/// Rises linearly from zero and holds `final_strength` from `ramp_time` on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRampField {
    pub ramp_time: f64,
    pub final_strength: f64,
}

impl FieldStrategy for LinearRampField {
    fn calculate_field(&self, time: f64) -> f64 {
        if self.ramp_time <= 0.0 {
            return if time >= 0.0 { self.final_strength } else { 0.0 };
        }
        self.final_strength * time.clamp(0.0, self.ramp_time) / self.ramp_time
    }
}

/// Half-cosine onset with zero slope at both ends of the ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosineRampField {
    pub ramp_time: f64,
    pub final_strength: f64,
}

impl FieldStrategy for CosineRampField {
    fn calculate_field(&self, time: f64) -> f64 {
        if time >= self.ramp_time {
            return self.final_strength;
        }
        if time <= 0.0 {
            return 0.0;
        }
        self.final_strength * (1.0 - (PI * time / self.ramp_time).cos()) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianPulseField {
    pub center: f64,
    pub width: f64,
    pub amplitude: f64,
}

impl FieldStrategy for GaussianPulseField {
    fn calculate_field(&self, time: f64) -> f64 {
        let u = (time - self.center) / self.width;
        self.amplitude * (-u * u).exp()
    }
}

/// Rectangular pulse, on for `turn_on_time <= t <= turn_off_time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowedPulseField {
    pub strength: f64,
    pub turn_on_time: f64,
    pub turn_off_time: f64,
}

impl FieldStrategy for WindowedPulseField {
    fn calculate_field(&self, time: f64) -> f64 {
        if (self.turn_on_time..=self.turn_off_time).contains(&time) {
            self.strength
        } else {
            0.0
        }
    }
}

/// Serializable description of a field, turned into a strategy by [`FieldConfig::build`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", rename_all_fields = "kebab-case", tag = "type")]
pub enum FieldConfig {
    Constant {
        strength: f64,
    },
    LinearRamp {
        ramp_time: f64,
        final_strength: f64,
    },
    CosineRamp {
        ramp_time: f64,
        final_strength: f64,
    },
    GaussianPulse {
        center: f64,
        width: f64,
        amplitude: f64,
    },
    WindowedPulse {
        strength: f64,
        turn_on_time: f64,
        turn_off_time: f64,
    },
}

impl FieldConfig {
    /// The default pulse used by studies: a Gaussian centred at 50 au, 20 au wide.
    pub fn default_pulse(amplitude: f64) -> Self {
        FieldConfig::GaussianPulse {
            center: DynamicsConstants::PULSE_CENTER,
            width: DynamicsConstants::PULSE_WIDTH,
            amplitude,
        }
    }

    pub fn build(&self) -> Box<dyn FieldStrategy> {
        match *self {
            FieldConfig::Constant { strength } => Box::new(ConstantField { strength }),
            FieldConfig::LinearRamp {
                ramp_time,
                final_strength,
            } => Box::new(LinearRampField {
                ramp_time,
                final_strength,
            }),
            FieldConfig::CosineRamp {
                ramp_time,
                final_strength,
            } => Box::new(CosineRampField {
                ramp_time,
                final_strength,
            }),
            FieldConfig::GaussianPulse {
                center,
                width,
                amplitude,
            } => Box::new(GaussianPulseField {
                center,
                width,
                amplitude,
            }),
            FieldConfig::WindowedPulse {
                strength,
                turn_on_time,
                turn_off_time,
            } => Box::new(WindowedPulseField {
                strength,
                turn_on_time,
                turn_off_time,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn constant_field_ignores_time() {
        let field = ConstantField { strength: 0.015 };
        for t in [-3.0, 0.0, 12.34, 1e6] {
            assert_eq!(field.calculate_field(t), 0.015);
        }
    }

    #[test]
    fn linear_ramp_reaches_and_holds_final_strength() {
        let field = LinearRampField {
            ramp_time: 50.0,
            final_strength: 0.02,
        };
        assert!(f64_approx_equal(field.calculate_field(0.0), 0.0));
        assert!(f64_approx_equal(field.calculate_field(25.0), 0.01));
        assert!(f64_approx_equal(field.calculate_field(50.0), 0.02));
        assert!(f64_approx_equal(field.calculate_field(80.0), 0.02));
    }

    #[test]
    fn linear_ramp_with_zero_duration_is_a_step() {
        let field = LinearRampField {
            ramp_time: 0.0,
            final_strength: 0.02,
        };
        assert_eq!(field.calculate_field(0.0), 0.02);
        assert_eq!(field.calculate_field(-1.0), 0.0);
    }

    #[test]
    fn cosine_ramp_is_half_way_at_mid_ramp() {
        let field = CosineRampField {
            ramp_time: 40.0,
            final_strength: 0.01,
        };
        assert!(f64_approx_equal(field.calculate_field(0.0), 0.0));
        assert!(f64_approx_equal(field.calculate_field(20.0), 0.005));
        assert!(f64_approx_equal(field.calculate_field(40.0), 0.01));
        assert!(f64_approx_equal(field.calculate_field(1000.0), 0.01));
    }

    #[test]
    fn cosine_ramp_starts_flatter_than_linear_ramp() {
        let cosine = CosineRampField {
            ramp_time: 50.0,
            final_strength: 1.0,
        };
        let linear = LinearRampField {
            ramp_time: 50.0,
            final_strength: 1.0,
        };
        assert!(cosine.calculate_field(5.0) < linear.calculate_field(5.0));
    }

    #[test]
    fn gaussian_pulse_peaks_at_center_and_decays() {
        let field = GaussianPulseField {
            center: 50.0,
            width: 20.0,
            amplitude: 0.015,
        };
        assert!(f64_approx_equal(field.calculate_field(50.0), 0.015));
        assert!(f64_approx_equal(
            field.calculate_field(70.0),
            0.015 * (-1.0f64).exp()
        ));
        assert!(f64_approx_equal(
            field.calculate_field(30.0),
            field.calculate_field(70.0)
        ));
        let far = field.calculate_field(250.0);
        assert!(far > 0.0 && far < 1e-15);
    }

    #[test]
    fn windowed_pulse_includes_both_edges() {
        let field = WindowedPulseField {
            strength: 0.01,
            turn_on_time: 10.0,
            turn_off_time: 20.0,
        };
        assert_eq!(field.calculate_field(9.999), 0.0);
        assert_eq!(field.calculate_field(10.0), 0.01);
        assert_eq!(field.calculate_field(15.5), 0.01);
        assert_eq!(field.calculate_field(20.0), 0.01);
        assert_eq!(field.calculate_field(20.001), 0.0);
    }

    #[test]
    fn config_builds_the_matching_strategy() {
        let field = FieldConfig::default_pulse(0.015).build();
        assert!(f64_approx_equal(field.calculate_field(50.0), 0.015));

        let field = FieldConfig::WindowedPulse {
            strength: 0.3,
            turn_on_time: 1.0,
            turn_off_time: 2.0,
        }
        .build();
        assert_eq!(field.calculate_field(1.5), 0.3);
    }
}
