use clap::{Args, Parser, Subcommand, ValueEnum};
use rtcneo::core::models::results::SimulationMode;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "RT-cNEO CLI - Real-time NEO and constrained NEO proton-transfer dynamics for FHF⁻.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Number of worker threads for running independent simulations.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Propagate a single RT-NEO or RT-cNEO trajectory and write it as CSV.
    Run(RunArgs),
    /// Run RT-NEO and RT-cNEO side by side and write a comparison report.
    Compare(CompareArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Unconstrained RT-NEO
    Neo,
    /// Constrained RT-cNEO
    Cneo,
}

impl From<Method> for SimulationMode {
    fn from(method: Method) -> Self {
        match method {
            Method::Neo => SimulationMode::RtNeo,
            Method::Cneo => SimulationMode::RtCneo,
        }
    }
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Propagation method.
    #[arg(short, long, value_enum, default_value_t = Method::Cneo)]
    pub mode: Method,

    /// Path for the output trajectory CSV.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    #[command(flatten)]
    pub simulation: SimulationArgs,
}

/// Arguments for the `compare` subcommand.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Directory that receives the trajectories and the summary.
    #[arg(short, long, default_value = "comparison_results", value_name = "DIR")]
    pub output: PathBuf,

    #[command(flatten)]
    pub simulation: SimulationArgs,
}

/// Configuration shared by every simulation command.
#[derive(Args, Debug, Default)]
pub struct SimulationArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the time step (atomic time units).
    #[arg(long, value_name = "FLOAT")]
    pub time_step: Option<f64>,

    /// Override the total simulated time (atomic time units).
    #[arg(short = 't', long, value_name = "FLOAT")]
    pub max_time: Option<f64>,

    /// Override the field amplitude (atomic units).
    #[arg(short = 'f', long, value_name = "FLOAT")]
    pub field_strength: Option<f64>,

    /// Override the RT-cNEO smoothing time constant (atomic time units).
    #[arg(short = 's', long, value_name = "FLOAT")]
    pub smoothing_time: Option<f64>,

    /// Rebuild the Fock matrix from the propagated density at every step.
    #[arg(long)]
    pub time_dependent_fock: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S simulation.max-time=200
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
