use crate::cli::CompareArgs;
use crate::config::PartialStudyConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use rtcneo::{engine::progress::ProgressReporter, workflows::comparison::ComparisonStudy};
use std::fs;
use tracing::info;

const METRICS_FILE: &str = "metrics.toml";

pub async fn run(args: CompareArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let factory = PartialStudyConfig::load(&args.simulation)?;
    let mut study = ComparisonStudy::new(factory);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting RT-NEO vs RT-cNEO comparison...");
    tokio::task::block_in_place(|| study.run_full_comparison(&reporter).map(|_| ()))?;

    let written = study.generate_report(&args.output)?;
    let metrics_path = args.output.join(METRICS_FILE);
    let metrics = toml::to_string(study.metrics()?)?;
    fs::write(&metrics_path, metrics)?;

    println!();
    println!("{}", study.summary()?);
    println!("Report written to: {}", args.output.display());
    for path in written.iter().chain(std::iter::once(&metrics_path)) {
        println!("  {}", path.display());
    }

    Ok(())
}
