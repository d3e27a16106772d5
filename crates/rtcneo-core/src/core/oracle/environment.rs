//! Process-wide numerical environment.
//!
//! The environment is installed once, before any oracle is prepared, and lives for the rest
//! of the process. Oracles receive it explicitly through [`EnergyOracle::prepare`] instead of
//! reading global state.
//!
//! [`EnergyOracle::prepare`]: super::EnergyOracle::prepare

use std::sync::OnceLock;
use thiserror::Error;
use tracing::info;

static ENVIRONMENT: OnceLock<ComputeEnvironment> = OnceLock::new();

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EnvironmentError {
    #[error("Compute environment is already initialized as {active:?}")]
    AlreadyInitialized { active: ComputeEnvironment },

    #[error("Thread count must be at least 1")]
    InvalidThreadCount,

    #[error("Failed to configure the worker thread pool: {0}")]
    ThreadPool(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeEnvironment {
    /// Size of the worker pool used for independent runs. `None` keeps the runtime default.
    pub worker_threads: Option<usize>,
    /// Threads available to the energy oracle's own numerics.
    pub oracle_threads: usize,
}

impl Default for ComputeEnvironment {
    fn default() -> Self {
        Self {
            worker_threads: None,
            oracle_threads: 1,
        }
    }
}

impl ComputeEnvironment {
    fn validate(&self) -> Result<(), EnvironmentError> {
        if self.worker_threads == Some(0) || self.oracle_threads == 0 {
            return Err(EnvironmentError::InvalidThreadCount);
        }
        Ok(())
    }
}

/// Installs `environment` for the rest of the process.
///
/// Re-installing an identical environment is a no-op; a different one is rejected.
pub fn initialize(
    environment: ComputeEnvironment,
) -> Result<&'static ComputeEnvironment, EnvironmentError> {
    environment.validate()?;

    let mut installed = false;
    let active = ENVIRONMENT.get_or_init(|| {
        installed = true;
        environment.clone()
    });

    if !installed {
        if *active != environment {
            return Err(EnvironmentError::AlreadyInitialized {
                active: active.clone(),
            });
        }
        return Ok(active);
    }

    info!(
        worker_threads = ?active.worker_threads,
        oracle_threads = active.oracle_threads,
        "Compute environment initialized"
    );
    configure_worker_pool(active)?;
    Ok(active)
}

/// The installed environment, installing the default on first use.
pub fn current() -> &'static ComputeEnvironment {
    ENVIRONMENT.get_or_init(ComputeEnvironment::default)
}

#[cfg(feature = "parallel")]
fn configure_worker_pool(environment: &ComputeEnvironment) -> Result<(), EnvironmentError> {
    if let Some(threads) = environment.worker_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| EnvironmentError::ThreadPool(e.to_string()))?;
    }
    Ok(())
}

#[cfg(not(feature = "parallel"))]
fn configure_worker_pool(_environment: &ComputeEnvironment) -> Result<(), EnvironmentError> {
    Ok(())
}
