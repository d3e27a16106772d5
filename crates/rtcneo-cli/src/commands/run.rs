use crate::cli::RunArgs;
use crate::config::PartialStudyConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use rtcneo::{
    core::io::{traits::TrajectoryFile, trajectory::CsvTrajectory},
    core::models::results::{SimulationMode, SimulationResults},
    engine::progress::ProgressReporter,
    workflows::analysis::TrajectoryAnalyzer,
};
use std::path::Path;
use tracing::info;

pub async fn run(args: RunArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let factory = PartialStudyConfig::load(&args.simulation)?;
    let mode = SimulationMode::from(args.mode);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Starting {} propagation ({} steps of {} au)...",
        mode,
        factory.params().step_count(),
        factory.params().time_step
    );
    let results = tokio::task::block_in_place(|| -> Result<_> {
        let mut simulator = factory.create_simulator()?;
        Ok(simulator.run(mode, &reporter)?)
    })?;

    write_trajectory(&results, &args.output)?;
    info!("Trajectory written to {:?}", &args.output);

    let analysis = TrajectoryAnalyzer::new().analyze(&results)?;
    println!("✓ {} trajectory written to: {}", mode, args.output.display());
    println!("  Final position:      {:+.6} Å", analysis.final_position);
    println!("  Max displacement:    {:.6} Å", analysis.max_displacement);
    println!("  Barrier crossings:   {}", analysis.barrier_crossings);
    if mode == SimulationMode::RtCneo {
        println!(
            "  Mean |constraint|:   {:.6e} au",
            analysis.mean_abs_constraint_force
        );
    }
    println!("  Assessment:          {}", analysis.assessment);

    Ok(())
}

fn write_trajectory(results: &SimulationResults, path: &Path) -> Result<()> {
    CsvTrajectory::write_to_path(results, path).map_err(|source| CliError::TrajectoryWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn results() -> SimulationResults {
        SimulationResults::new(
            SimulationMode::RtNeo,
            vec![0.1, 0.2],
            vec![-0.15, -0.14],
            vec![-1.0, -1.0],
            vec![0.0, 0.0],
            BTreeMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn trajectory_is_written_to_the_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trajectory.csv");
        write_trajectory(&results(), &path).unwrap();
        assert_eq!(CsvTrajectory::read_from_path(&path).unwrap().len(), 2);
    }

    #[test]
    fn unwritable_output_is_a_trajectory_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("trajectory.csv");
        let err = write_trajectory(&results(), &path).unwrap_err();
        assert!(matches!(err, CliError::TrajectoryWrite { path: p, .. } if p == path));
    }
}
