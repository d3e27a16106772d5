use crate::cli::SimulationArgs;
use crate::error::{CliError, Result};
use rtcneo::core::constants::{DynamicsConstants, NumericalSettings, PotentialParameters};
use rtcneo::core::fields::FieldConfig;
use rtcneo::core::models::params::{SimulationParameters, SimulationParametersBuilder};
use rtcneo::engine::factory::{PotentialConfig, SimulationFactory};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialSimulationConfig {
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

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", rename_all_fields = "kebab-case", tag = "type")]
enum PartialPotentialConfig {
    DoubleWell {
        a: Option<f64>,
        b: Option<f64>,
        c: Option<f64>,
        d: Option<f64>,
    },
    ModelOracle {
        step_size: Option<f64>,
    },
}

impl From<PartialPotentialConfig> for PotentialConfig {
    fn from(p: PartialPotentialConfig) -> Self {
        match p {
            PartialPotentialConfig::DoubleWell { a, b, c, d } => {
                let defaults = PotentialParameters::default();
                PotentialConfig::DoubleWell(PotentialParameters {
                    a: a.unwrap_or(defaults.a),
                    b: b.unwrap_or(defaults.b),
                    c: c.unwrap_or(defaults.c),
                    d: d.unwrap_or(defaults.d),
                })
            }
            PartialPotentialConfig::ModelOracle { step_size } => PotentialConfig::ModelOracle {
                step_size: step_size.unwrap_or(DynamicsConstants::FINITE_DIFFERENCE_STEP),
            },
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialNumericsConfig {
    eigenvalue_floor: Option<f64>,
    trace_tolerance: Option<f64>,
    hard_tolerance_ratio: Option<f64>,
    field_coupling_factor: Option<f64>,
    nuclear_grid_points: Option<usize>,
    initial_packet_width: Option<f64>,
}

impl PartialNumericsConfig {
    fn resolve(self) -> NumericalSettings {
        let defaults = NumericalSettings::default();
        NumericalSettings {
            eigenvalue_floor: self.eigenvalue_floor.unwrap_or(defaults.eigenvalue_floor),
            trace_tolerance: self.trace_tolerance.unwrap_or(defaults.trace_tolerance),
            hard_tolerance_ratio: self
                .hard_tolerance_ratio
                .unwrap_or(defaults.hard_tolerance_ratio),
            field_coupling_factor: self
                .field_coupling_factor
                .unwrap_or(defaults.field_coupling_factor),
            nuclear_grid_points: self
                .nuclear_grid_points
                .unwrap_or(defaults.nuclear_grid_points),
            initial_packet_width: self
                .initial_packet_width
                .unwrap_or(defaults.initial_packet_width),
        }
    }
}

/// Contents of a study configuration file. Every section and key is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialStudyConfig {
    simulation: Option<PartialSimulationConfig>,
    field: Option<FieldConfig>,
    potential: Option<PartialPotentialConfig>,
    numerics: Option<PartialNumericsConfig>,
}

impl PartialStudyConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads the file named by `--config`, if any, and resolves it against the CLI arguments.
    pub fn load(args: &SimulationArgs) -> Result<SimulationFactory> {
        let partial = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        partial.merge_with_cli(args)
    }

    /// Command-line flags win over `--set` values, which win over the file.
    pub fn merge_with_cli(mut self, args: &SimulationArgs) -> Result<SimulationFactory> {
        self.apply_set_values(&args.set_values)?;

        let sim = self.simulation.take().unwrap_or_default();
        let defaults = SimulationParameters::default();
        let params = SimulationParametersBuilder::new()
            .time_step(args.time_step.or(sim.time_step).unwrap_or(defaults.time_step))
            .max_time(args.max_time.or(sim.max_time).unwrap_or(defaults.max_time))
            .field_strength(
                args.field_strength
                    .or(sim.field_strength)
                    .unwrap_or(defaults.field_strength),
            )
            .smoothing_time(
                args.smoothing_time
                    .or(sim.smoothing_time)
                    .unwrap_or(defaults.smoothing_time),
            )
            .fluorine_distance(sim.fluorine_distance.unwrap_or(defaults.fluorine_distance))
            .basis(sim.basis.unwrap_or(defaults.basis))
            .proton_basis(sim.proton_basis.unwrap_or(defaults.proton_basis))
            .convergence_threshold(
                sim.convergence_threshold
                    .unwrap_or(defaults.convergence_threshold),
            )
            .max_scf_cycles(sim.max_scf_cycles.unwrap_or(defaults.max_scf_cycles))
            .use_time_dependent_fock(
                args.time_dependent_fock
                    || sim
                        .use_time_dependent_fock
                        .unwrap_or(defaults.use_time_dependent_fock),
            )
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let mut factory = SimulationFactory::new(params)
            .with_numerical_settings(self.numerics.take().unwrap_or_default().resolve());
        if let Some(field) = self.field {
            factory = factory.with_field(field);
        }
        if let Some(potential) = self.potential {
            factory = factory.with_potential(potential.into());
        }
        Ok(factory)
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "simulation.time-step" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .time_step = Some(parse(key, value)?);
                }
                "simulation.max-time" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .max_time = Some(parse(key, value)?);
                }
                "simulation.field-strength" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .field_strength = Some(parse(key, value)?);
                }
                "simulation.smoothing-time" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .smoothing_time = Some(parse(key, value)?);
                }
                "simulation.fluorine-distance" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .fluorine_distance = Some(parse(key, value)?);
                }
                "simulation.convergence-threshold" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .convergence_threshold = Some(parse(key, value)?);
                }
                "simulation.max-scf-cycles" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .max_scf_cycles = Some(parse(key, value)?);
                }
                "simulation.use-time-dependent-fock" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .use_time_dependent_fock = Some(parse(key, value)?);
                }
                "numerics.nuclear-grid-points" => {
                    self.numerics
                        .get_or_insert_with(Default::default)
                        .nuclear_grid_points = Some(parse(key, value)?);
                }
                "numerics.hard-tolerance-ratio" => {
                    self.numerics
                        .get_or_insert_with(Default::default)
                        .hard_tolerance_ratio = Some(parse(key, value)?);
                }
                "numerics.trace-tolerance" => {
                    self.numerics
                        .get_or_insert_with(Default::default)
                        .trace_tolerance = Some(parse(key, value)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn run_args(extra: &[&str]) -> SimulationArgs {
        let mut args = vec!["rtcneo", "run", "-o", "out.csv"];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Run(run) => run.simulation,
            _ => panic!("Expected 'run' subcommand"),
        }
    }

    #[test]
    fn defaults_apply_without_a_config_file() {
        let factory = PartialStudyConfig::load(&run_args(&[])).unwrap();
        assert_eq!(factory.params(), &SimulationParameters::default());
        assert_eq!(factory.field(), &FieldConfig::default_pulse(0.015));
        assert_eq!(factory.numerical_settings(), &NumericalSettings::default());
    }

    #[test]
    fn file_values_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "study.toml",
            r#"
        [simulation]
        time-step = 0.2
        max-time = 40.0
        smoothing-time = 5.0

        [field]
        type = "linear-ramp"
        ramp-time = 10.0
        final-strength = 0.01

        [potential]
        type = "double-well"
        a = 0.2

        [numerics]
        nuclear-grid-points = 48
        "#,
        );
        let factory = PartialStudyConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&SimulationArgs::default())
            .unwrap();

        assert_eq!(factory.params().time_step, 0.2);
        assert_eq!(factory.params().max_time, 40.0);
        assert_eq!(factory.params().smoothing_time, 5.0);
        assert_eq!(
            factory.field(),
            &FieldConfig::LinearRamp {
                ramp_time: 10.0,
                final_strength: 0.01
            }
        );
        assert_eq!(factory.numerical_settings().nuclear_grid_points, 48);
        assert_eq!(factory.numerical_settings().eigenvalue_floor, 1e-14);
    }

    #[test]
    fn cli_flags_override_set_values_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "override.toml",
            r#"
        [simulation]
        max-time = 40.0 # Will be overridden by --max-time
        field-strength = 0.02 # Will be overridden by --set
        "#,
        );
        let config = path.to_str().unwrap();
        let args = run_args(&[
            "-c",
            config,
            "--max-time",
            "80",
            "-S",
            "simulation.field-strength=0.03",
            "-S",
            "simulation.max-time=60",
            "--time-dependent-fock",
        ]);
        let factory = PartialStudyConfig::load(&args).unwrap();

        assert_eq!(factory.params().max_time, 80.0);
        assert_eq!(factory.params().field_strength, 0.03);
        assert!(factory.params().use_time_dependent_fock);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "typo.toml", "[simulation]\ntimestep = 0.1\n");
        assert!(matches!(
            PartialStudyConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn malformed_set_values_are_config_errors() {
        for set in ["simulation.max-time", "simulation.unknown=1", "simulation.max-time=abc"] {
            let args = run_args(&["-S", set]);
            assert!(matches!(
                PartialStudyConfig::load(&args),
                Err(CliError::Config(_))
            ));
        }
    }

    #[test]
    fn invalid_parameters_are_config_errors() {
        let args = run_args(&["--time-step", "0"]);
        match PartialStudyConfig::load(&args) {
            Err(CliError::Config(msg)) => assert!(msg.contains("Time step")),
            other => panic!("Expected a configuration error, got {:?}", other.map(|_| ())),
        }
    }
}
