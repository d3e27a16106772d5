use rtcneo::core::io::trajectory::TrajectoryIoError;
use rtcneo::core::oracle::environment::EnvironmentError;
use rtcneo::engine::error::EngineError;
use rtcneo::workflows::analysis::AnalysisError;
use rtcneo::workflows::comparison::{ReportError, StudyError};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Study(#[from] StudyError),

    #[error("Report generation failed: {0}")]
    Report(#[from] ReportError),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to process file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write trajectory '{path}': {source}", path = path.display())]
    TrajectoryWrite {
        path: PathBuf,
        #[source]
        source: TrajectoryIoError,
    },

    #[error("Failed to serialize metrics: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
