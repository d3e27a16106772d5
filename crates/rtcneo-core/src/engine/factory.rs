use super::error::EngineError;
use super::simulator::DynamicsSimulator;
use crate::core::constants::{DynamicsConstants, NumericalSettings, PotentialParameters};
use crate::core::electronic::ScfSettings;
use crate::core::fields::FieldConfig;
use crate::core::models::params::SimulationParameters;
use crate::core::models::system::MolecularSystem;
use crate::core::oracle::environment;
use crate::core::oracle::{ModelOracle, OracleError, SharedOracle, shared};
use crate::core::potentials::{DoubleWellPotential, NumericalGradientPotential, PotentialStrategy};
use std::sync::OnceLock;
use tracing::debug;

/// Source of the proton force for new simulators.
#[derive(Debug, Clone)]
pub enum PotentialConfig {
    /// Analytic double well.
    DoubleWell(PotentialParameters),
    /// Finite differences over one [`ModelOracle`], created on first use and shared by
    /// every simulator of the factory.
    ModelOracle { step_size: f64 },
    /// Finite differences over a caller-supplied oracle shared by every simulator.
    Oracle { oracle: SharedOracle, step_size: f64 },
}

impl Default for PotentialConfig {
    fn default() -> Self {
        PotentialConfig::DoubleWell(PotentialParameters::default())
    }
}

/// Assembles independent simulators that share one configuration.
#[derive(Debug, Clone)]
pub struct SimulationFactory {
    params: SimulationParameters,
    field: FieldConfig,
    potential: PotentialConfig,
    settings: NumericalSettings,
    model_oracle: OnceLock<SharedOracle>,
}

impl SimulationFactory {
    /// Defaults to a Gaussian pulse of amplitude `field_strength` and the analytic double well.
    pub fn new(params: SimulationParameters) -> Self {
        Self {
            field: FieldConfig::default_pulse(params.field_strength),
            params,
            potential: PotentialConfig::default(),
            settings: NumericalSettings::default(),
            model_oracle: OnceLock::new(),
        }
    }

    pub fn with_field(mut self, field: FieldConfig) -> Self {
        self.field = field;
        self
    }

    pub fn with_potential(mut self, potential: PotentialConfig) -> Self {
        self.potential = potential;
        self.model_oracle = OnceLock::new();
        self
    }

    pub fn with_numerical_settings(mut self, settings: NumericalSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn field(&self) -> &FieldConfig {
        &self.field
    }

    pub fn numerical_settings(&self) -> &NumericalSettings {
        &self.settings
    }

    /// The oracle behind [`PotentialConfig::ModelOracle`], once a potential has used it.
    pub fn model_oracle(&self) -> Option<&SharedOracle> {
        self.model_oracle.get()
    }

    pub fn create_system(&self) -> Result<MolecularSystem, EngineError> {
        Ok(MolecularSystem::bifluoride(&self.params)?)
    }

    pub fn create_potential(
        &self,
        system: &MolecularSystem,
    ) -> Result<Box<dyn PotentialStrategy>, EngineError> {
        match &self.potential {
            PotentialConfig::DoubleWell(p) => Ok(Box::new(DoubleWellPotential::new(*p))),
            PotentialConfig::ModelOracle { step_size } => {
                let oracle = self
                    .model_oracle
                    .get_or_init(|| shared(ModelOracle::new(ScfSettings::from(&self.params))));
                Self::oracle_potential(oracle.clone(), system, *step_size)
            }
            PotentialConfig::Oracle { oracle, step_size } => {
                Self::oracle_potential(oracle.clone(), system, *step_size)
            }
        }
    }

    fn oracle_potential(
        oracle: SharedOracle,
        system: &MolecularSystem,
        step_size: f64,
    ) -> Result<Box<dyn PotentialStrategy>, EngineError> {
        {
            let mut guard = oracle.lock().map_err(|_| OracleError::Poisoned)?;
            if !guard.is_prepared() {
                debug!("Preparing energy oracle for the bifluoride system");
                guard.prepare(system, environment::current())?;
            }
        }
        Ok(Box::new(NumericalGradientPotential::with_step_size(
            oracle,
            system.clone(),
            step_size,
        )))
    }

    pub fn create_simulator(&self) -> Result<DynamicsSimulator, EngineError> {
        let system = self.create_system()?;
        let potential = self.create_potential(&system)?;
        DynamicsSimulator::new(
            self.params.clone(),
            self.settings,
            system,
            self.field.build(),
            potential,
        )
    }
}

impl PotentialConfig {
    pub fn model_oracle() -> Self {
        PotentialConfig::ModelOracle {
            step_size: DynamicsConstants::FINITE_DIFFERENCE_STEP,
        }
    }
}
