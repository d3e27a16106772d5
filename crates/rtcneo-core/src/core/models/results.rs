use super::state::DynamicsState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimulationMode {
    /// Unconstrained propagation of the coupled electronic and nuclear densities.
    #[serde(rename = "RT-NEO")]
    RtNeo,
    /// Propagation with the smoothed-force constraint folded into the equations of motion.
    #[serde(rename = "RT-cNEO")]
    RtCneo,
}

impl SimulationMode {
    pub fn label(&self) -> &'static str {
        match self {
            SimulationMode::RtNeo => "RT-NEO",
            SimulationMode::RtCneo => "RT-cNEO",
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ResultsError {
    #[error("Trajectory column '{column}' has {found} entries, expected {expected}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        found: usize,
    },
}

/// A completed trajectory.
///
/// All sequences share one length and one index-to-time correspondence. The container is
/// immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResults {
    method: SimulationMode,
    times: Vec<f64>,
    positions: Vec<f64>,
    energies: Vec<f64>,
    constraint_forces: Vec<f64>,
    convergence_info: BTreeMap<String, f64>,
}

impl SimulationResults {
    pub fn new(
        method: SimulationMode,
        times: Vec<f64>,
        positions: Vec<f64>,
        energies: Vec<f64>,
        constraint_forces: Vec<f64>,
        convergence_info: BTreeMap<String, f64>,
    ) -> Result<Self, ResultsError> {
        let expected = times.len();
        for (column, found) in [
            ("positions", positions.len()),
            ("energies", energies.len()),
            ("constraint_forces", constraint_forces.len()),
        ] {
            if found != expected {
                return Err(ResultsError::LengthMismatch {
                    column,
                    expected,
                    found,
                });
            }
        }
        Ok(Self {
            method,
            times,
            positions,
            energies,
            constraint_forces,
            convergence_info,
        })
    }

    pub fn method(&self) -> SimulationMode {
        self.method
    }
    pub fn times(&self) -> &[f64] {
        &self.times
    }
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }
    pub fn constraint_forces(&self) -> &[f64] {
        &self.constraint_forces
    }
    pub fn convergence_info(&self) -> &BTreeMap<String, f64> {
        &self.convergence_info
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn final_position(&self) -> Option<f64> {
        self.positions.last().copied()
    }

    /// Largest distance of the proton from the barrier top at x = 0.
    pub fn max_displacement(&self) -> Option<f64> {
        self.positions.iter().map(|x| x.abs()).reduce(f64::max)
    }

    /// Number of sign changes of the position sequence.
    ///
    /// A sample exactly at zero has sign zero, so touching the barrier and leaving it again
    /// counts as two changes.
    pub fn count_barrier_crossings(&self) -> usize {
        self.positions
            .windows(2)
            .filter(|w| sign(w[0]) != sign(w[1]))
            .count()
    }
}

#[inline]
fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Append-only accumulator owned by the simulator during a run.
///
/// [`TrajectoryRecorder::finish`] moves the arrays into an immutable [`SimulationResults`].
#[derive(Debug)]
pub struct TrajectoryRecorder {
    method: SimulationMode,
    times: Vec<f64>,
    positions: Vec<f64>,
    energies: Vec<f64>,
    constraint_forces: Vec<f64>,
    convergence_info: BTreeMap<String, f64>,
}

impl TrajectoryRecorder {
    pub fn with_capacity(method: SimulationMode, capacity: usize) -> Self {
        Self {
            method,
            times: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            energies: Vec::with_capacity(capacity),
            constraint_forces: Vec::with_capacity(capacity),
            convergence_info: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, state: &DynamicsState) {
        self.times.push(state.time);
        self.positions.push(state.position);
        self.energies.push(state.energy);
        self.constraint_forces.push(state.constraint_force);
    }

    pub fn set_diagnostic(&mut self, key: impl Into<String>, value: f64) {
        self.convergence_info.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn finish(self) -> SimulationResults {
        SimulationResults {
            method: self.method,
            times: self.times,
            positions: self.positions,
            energies: self.energies,
            constraint_forces: self.constraint_forces,
            convergence_info: self.convergence_info,
        }
    }
}
