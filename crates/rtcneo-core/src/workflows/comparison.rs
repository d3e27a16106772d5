use super::analysis::{AnalysisError, ComparisonMetrics, TrajectoryAnalysis, TrajectoryAnalyzer};
use crate::core::constants::DynamicsConstants;
use crate::core::io::traits::TrajectoryFile;
use crate::core::io::trajectory::{CsvTrajectory, TrajectoryIoError};
use crate::core::models::params::SimulationParameters;
use crate::core::models::results::{SimulationMode, SimulationResults};
use crate::engine::error::EngineError;
use crate::engine::factory::SimulationFactory;
use crate::engine::progress::{Progress, ProgressReporter};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

pub const RTNEO_TRAJECTORY_FILE: &str = "rtneo_trajectory.csv";
pub const RTCNEO_TRAJECTORY_FILE: &str = "rtcneo_trajectory.csv";
pub const SUMMARY_FILE: &str = "comparison_summary.txt";

#[derive(Debug, Error)]
pub enum StudyError {
    #[error("Simulation failed: {0}")]
    Engine(#[from] EngineError),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Failed to write report file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to write trajectory: {0}")]
    Trajectory(#[from] TrajectoryIoError),
}

#[derive(Debug, Clone)]
struct CompletedStudy {
    rtneo: SimulationResults,
    rtcneo: SimulationResults,
    metrics: ComparisonMetrics,
}

/// Runs RT-NEO and RT-cNEO from one configuration and compares the trajectories.
///
/// Each method gets its own simulator from the factory, so the two runs share no mutable
/// state. With the `parallel` feature they run concurrently.
#[derive(Debug, Clone)]
pub struct ComparisonStudy {
    factory: SimulationFactory,
    completed: Option<CompletedStudy>,
}

impl ComparisonStudy {
    pub fn new(factory: SimulationFactory) -> Self {
        Self {
            factory,
            completed: None,
        }
    }

    pub fn factory(&self) -> &SimulationFactory {
        &self.factory
    }

    pub fn is_complete(&self) -> bool {
        self.completed.is_some()
    }

    #[instrument(skip_all, name = "comparison_study")]
    pub fn run_full_comparison(
        &mut self,
        reporter: &ProgressReporter,
    ) -> Result<(&SimulationResults, &SimulationResults), StudyError> {
        let ticks = self
            .factory
            .params()
            .step_count()
            .div_ceil(DynamicsConstants::PROGRESS_REPORT_INTERVAL) as u64;
        reporter.report(Progress::PhaseStart {
            name: "RT-NEO vs RT-cNEO",
        });
        reporter.report(Progress::TaskStart {
            total_steps: 2 * ticks,
        });

        // Per-run phase events would interleave; only ticks and messages reach the caller.
        let forward = ProgressReporter::with_callback(Box::new(|event: Progress| match event {
            Progress::TaskIncrement | Progress::Message(_) => reporter.report(event),
            _ => {}
        }));
        let (rtneo, rtcneo) = run_both(&self.factory, &forward);
        reporter.report(Progress::TaskFinish);
        reporter.report(Progress::PhaseFinish);
        let rtneo = rtneo?;
        let rtcneo = rtcneo?;

        let metrics = ComparisonMetrics::compute(&rtneo, &rtcneo)?;
        info!(
            smoothness_ratio = metrics.smoothness_ratio,
            correlation = metrics.trajectory_correlation,
            "Comparison complete"
        );
        let completed = self.completed.insert(CompletedStudy {
            rtneo,
            rtcneo,
            metrics,
        });
        Ok((&completed.rtneo, &completed.rtcneo))
    }

    fn require_completed(&self, operation: &'static str) -> Result<&CompletedStudy, AnalysisError> {
        self.completed
            .as_ref()
            .ok_or(AnalysisError::Prerequisite { operation })
    }

    pub fn results(&self) -> Result<(&SimulationResults, &SimulationResults), AnalysisError> {
        let done = self.require_completed("Reading results")?;
        Ok((&done.rtneo, &done.rtcneo))
    }

    pub fn metrics(&self) -> Result<&ComparisonMetrics, AnalysisError> {
        Ok(&self.require_completed("Computing metrics")?.metrics)
    }

    pub fn summary(&self) -> Result<StudySummary<'_>, AnalysisError> {
        let done = self.require_completed("Summarizing")?;
        let analyzer = TrajectoryAnalyzer::new();
        Ok(StudySummary {
            params: self.factory.params(),
            metrics: &done.metrics,
            rtneo: analyzer.analyze(&done.rtneo)?,
            rtcneo: analyzer.analyze(&done.rtcneo)?,
        })
    }

    /// Writes both trajectories and the text summary into `dir`, creating it if needed.
    ///
    /// Returns the paths written, in order: RT-NEO trajectory, RT-cNEO trajectory, summary.
    pub fn generate_report(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ReportError> {
        let done = self.require_completed("Generating a report")?;
        let summary = self.summary()?;
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let rtneo_path = dir.join(RTNEO_TRAJECTORY_FILE);
        let rtcneo_path = dir.join(RTCNEO_TRAJECTORY_FILE);
        let summary_path = dir.join(SUMMARY_FILE);
        CsvTrajectory::write_to_path(&done.rtneo, &rtneo_path)?;
        CsvTrajectory::write_to_path(&done.rtcneo, &rtcneo_path)?;
        fs::write(&summary_path, format!("{}{summary}", ParameterTable(summary.params)))?;

        info!(dir = %dir.display(), "Comparison report written");
        Ok(vec![rtneo_path, rtcneo_path, summary_path])
    }
}

#[cfg(feature = "parallel")]
fn run_both(
    factory: &SimulationFactory,
    reporter: &ProgressReporter,
) -> (
    Result<SimulationResults, EngineError>,
    Result<SimulationResults, EngineError>,
) {
    rayon::join(
        || run_one(factory, SimulationMode::RtNeo, reporter),
        || run_one(factory, SimulationMode::RtCneo, reporter),
    )
}

#[cfg(not(feature = "parallel"))]
fn run_both(
    factory: &SimulationFactory,
    reporter: &ProgressReporter,
) -> (
    Result<SimulationResults, EngineError>,
    Result<SimulationResults, EngineError>,
) {
    (
        run_one(factory, SimulationMode::RtNeo, reporter),
        run_one(factory, SimulationMode::RtCneo, reporter),
    )
}

fn run_one(
    factory: &SimulationFactory,
    mode: SimulationMode,
    reporter: &ProgressReporter,
) -> Result<SimulationResults, EngineError> {
    let mut simulator = factory.create_simulator()?;
    let results = simulator.run(mode, reporter)?;
    reporter.report(Progress::Message(format!("{mode} finished")));
    Ok(results)
}

struct ParameterTable<'a>(&'a SimulationParameters);

impl fmt::Display for ParameterTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.0;
        writeln!(f, "Simulation Parameters:")?;
        writeln!(f, "  {:<25}: {}", "time_step", p.time_step)?;
        writeln!(f, "  {:<25}: {}", "max_time", p.max_time)?;
        writeln!(f, "  {:<25}: {}", "field_strength", p.field_strength)?;
        writeln!(f, "  {:<25}: {}", "smoothing_time", p.smoothing_time)?;
        writeln!(f, "  {:<25}: {}", "fluorine_distance", p.fluorine_distance)?;
        writeln!(f, "  {:<25}: {}", "basis", p.basis)?;
        writeln!(f, "  {:<25}: {}", "proton_basis", p.proton_basis)?;
        writeln!(f, "  {:<25}: {}", "convergence_threshold", p.convergence_threshold)?;
        writeln!(f, "  {:<25}: {}", "max_scf_cycles", p.max_scf_cycles)?;
        writeln!(f, "  {:<25}: {}", "use_time_dependent_fock", p.use_time_dependent_fock)?;
        writeln!(f)
    }
}

/// Human-readable comparison of a completed study.
#[derive(Debug, Clone, Copy)]
pub struct StudySummary<'a> {
    pub params: &'a SimulationParameters,
    pub metrics: &'a ComparisonMetrics,
    pub rtneo: TrajectoryAnalysis,
    pub rtcneo: TrajectoryAnalysis,
}

impl fmt::Display for StudySummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.metrics;
        writeln!(f, "Final Positions:")?;
        writeln!(f, "  RT-NEO:  {:.6} Å", self.rtneo.final_position)?;
        writeln!(f, "  RT-cNEO: {:.6} Å", self.rtcneo.final_position)?;
        writeln!(f, "  Difference: {:.6} Å", m.final_position_difference)?;
        writeln!(f)?;
        writeln!(f, "Transfer Assessment:")?;
        writeln!(f, "  RT-NEO:  {}", self.rtneo.assessment)?;
        writeln!(f, "  RT-cNEO: {}", self.rtcneo.assessment)?;
        writeln!(f)?;
        writeln!(f, "Smoothness Ratio: {:.4}", m.smoothness_ratio)?;
        writeln!(f, "Trajectory Correlation: {:.4}", m.trajectory_correlation)?;
        writeln!(f)?;
        writeln!(f, "Barrier Crossings:")?;
        writeln!(f, "  RT-NEO:  {}", m.rtneo_crossings)?;
        writeln!(f, "  RT-cNEO: {}", m.rtcneo_crossings)?;
        writeln!(f)?;
        writeln!(f, "Energy Drift:")?;
        writeln!(f, "  RT-NEO:  {:.2e}", m.rtneo_energy_drift)?;
        writeln!(f, "  RT-cNEO: {:.2e}", m.rtcneo_energy_drift)?;
        writeln!(f, "  Ratio:   {:.4}", m.drift_ratio)?;
        writeln!(f)?;
        writeln!(
            f,
            "Mean |Constraint Force| (RT-cNEO): {:.6e}",
            self.rtcneo.mean_abs_constraint_force
        )
    }
}
