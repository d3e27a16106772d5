use crate::core::constants::DynamicsConstants;
use crate::core::models::results::{SimulationMode, SimulationResults};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Samples needed for a second finite difference.
const MIN_SAMPLES: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("{operation} requires a completed comparison run")]
    Prerequisite { operation: &'static str },

    #[error("Trajectories differ in length: {left} vs {right} samples")]
    LengthMismatch { left: usize, right: usize },

    #[error("At least {required} samples are required, found {found}")]
    InsufficientData { required: usize, found: usize },
}

/// Where the proton ended up relative to the transfer threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAssessment {
    /// Past the threshold on the acceptor side (x > threshold).
    Transferred,
    /// Within the threshold of the barrier top.
    Delocalized,
    /// Past the threshold on the donor side (x < −threshold).
    Retained,
}

impl fmt::Display for TransferAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TransferAssessment::Transferred => "proton transferred",
            TransferAssessment::Delocalized => "proton delocalized over the barrier",
            TransferAssessment::Retained => "proton retained on the donor",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryAnalysis {
    pub method: SimulationMode,
    pub final_position: f64,
    pub max_displacement: f64,
    pub barrier_crossings: usize,
    pub mean_abs_constraint_force: f64,
    pub assessment: TransferAssessment,
}

/// Summarizes a single trajectory.
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryAnalyzer {
    threshold: f64,
}

impl Default for TrajectoryAnalyzer {
    fn default() -> Self {
        Self {
            threshold: DynamicsConstants::TRANSFER_THRESHOLD,
        }
    }
}

impl TrajectoryAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `threshold` (Å) instead of the default transfer threshold.
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn assess(&self, final_position: f64) -> TransferAssessment {
        if final_position > self.threshold {
            TransferAssessment::Transferred
        } else if final_position < -self.threshold {
            TransferAssessment::Retained
        } else {
            TransferAssessment::Delocalized
        }
    }

    pub fn analyze(
        &self,
        results: &SimulationResults,
    ) -> Result<TrajectoryAnalysis, AnalysisError> {
        let (Some(final_position), Some(max_displacement)) =
            (results.final_position(), results.max_displacement())
        else {
            return Err(AnalysisError::InsufficientData {
                required: 1,
                found: 0,
            });
        };
        let forces = results.constraint_forces();
        let mean_abs_constraint_force =
            forces.iter().map(|f| f.abs()).sum::<f64>() / forces.len() as f64;

        Ok(TrajectoryAnalysis {
            method: results.method(),
            final_position,
            max_displacement,
            barrier_crossings: results.count_barrier_crossings(),
            mean_abs_constraint_force,
            assessment: self.assess(final_position),
        })
    }
}

/// Pairwise metrics between an RT-NEO and an RT-cNEO run on the same time grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ComparisonMetrics {
    /// Roughness of RT-NEO over roughness of RT-cNEO; above 1 when RT-cNEO is smoother.
    pub smoothness_ratio: f64,
    pub final_position_difference: f64,
    pub trajectory_correlation: f64,
    pub rtneo_energy_drift: f64,
    pub rtcneo_energy_drift: f64,
    pub drift_ratio: f64,
    pub rtneo_crossings: usize,
    pub rtcneo_crossings: usize,
}

impl ComparisonMetrics {
    pub fn compute(
        rtneo: &SimulationResults,
        rtcneo: &SimulationResults,
    ) -> Result<Self, AnalysisError> {
        check_pair(rtneo.len(), rtcneo.len())?;
        let rtneo_energy_drift = energy_drift(rtneo.energies());
        let rtcneo_energy_drift = energy_drift(rtcneo.energies());

        Ok(Self {
            smoothness_ratio: smoothness_ratio(rtneo, rtcneo)?,
            final_position_difference: final_position_difference(rtneo, rtcneo)?,
            trajectory_correlation: pearson_correlation(rtneo.positions(), rtcneo.positions())?,
            rtneo_energy_drift,
            rtcneo_energy_drift,
            drift_ratio: if rtcneo_energy_drift > 0.0 {
                rtneo_energy_drift / rtcneo_energy_drift
            } else {
                f64::INFINITY
            },
            rtneo_crossings: rtneo.count_barrier_crossings(),
            rtcneo_crossings: rtcneo.count_barrier_crossings(),
        })
    }
}

fn check_pair(left: usize, right: usize) -> Result<(), AnalysisError> {
    if left != right {
        return Err(AnalysisError::LengthMismatch { left, right });
    }
    if left < MIN_SAMPLES {
        return Err(AnalysisError::InsufficientData {
            required: MIN_SAMPLES,
            found: left,
        });
    }
    Ok(())
}

/// Second finite difference of `positions` with uniform spacing `dt`.
pub fn accelerations(positions: &[f64], dt: f64) -> Vec<f64> {
    positions
        .windows(3)
        .map(|w| ((w[2] - w[1]) / dt - (w[1] - w[0]) / dt) / dt)
        .collect()
}

/// Population standard deviation; zero for an empty slice.
pub fn standard_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// `std(a_NEO) / std(a_cNEO)` of the numerically differentiated accelerations.
///
/// The time step is taken from the first two RT-NEO samples. Returns +∞ when the RT-cNEO
/// acceleration has no spread.
pub fn smoothness_ratio(
    rtneo: &SimulationResults,
    rtcneo: &SimulationResults,
) -> Result<f64, AnalysisError> {
    check_pair(rtneo.len(), rtcneo.len())?;
    let dt = rtneo.times()[1] - rtneo.times()[0];
    let rtneo_roughness = standard_deviation(&accelerations(rtneo.positions(), dt));
    let rtcneo_roughness = standard_deviation(&accelerations(rtcneo.positions(), dt));
    if rtcneo_roughness > 0.0 {
        Ok(rtneo_roughness / rtcneo_roughness)
    } else {
        Ok(f64::INFINITY)
    }
}

pub fn final_position_difference(
    rtneo: &SimulationResults,
    rtcneo: &SimulationResults,
) -> Result<f64, AnalysisError> {
    match (rtneo.final_position(), rtcneo.final_position()) {
        (Some(a), Some(b)) => Ok((a - b).abs()),
        _ => Err(AnalysisError::InsufficientData {
            required: 1,
            found: 0,
        }),
    }
}

/// Pearson correlation coefficient; NaN when either series is constant.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Result<f64, AnalysisError> {
    check_pair(a.len(), b.len())?;
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return Ok(f64::NAN);
    }
    Ok(cov / (var_a * var_b).sqrt())
}

/// `std(E) / |mean(E)|`.
pub fn energy_drift(energies: &[f64]) -> f64 {
    if energies.is_empty() {
        return f64::NAN;
    }
    let mean = energies.iter().sum::<f64>() / energies.len() as f64;
    standard_deviation(energies) / mean.abs()
}
