use super::error::{EngineError, Subsystem};
use super::nuclear::NuclearGrid;
use super::progress::{Progress, ProgressReporter};
use super::propagation::{PropagatorCache, evolve};
use super::stability::{StabilityGuard, TraceViolation};
use crate::core::constants::{DynamicsConstants, NumericalSettings, PhysicalConstants};
use crate::core::constraint::ConstraintForceCalculator;
use crate::core::electronic::{ACTIVE_ELECTRONS, ElectronicModel, ScfSettings};
use crate::core::fields::FieldStrategy;
use crate::core::models::params::{ConfigError, SimulationParameters};
use crate::core::models::results::{SimulationMode, SimulationResults, TrajectoryRecorder};
use crate::core::models::state::{DynamicsState, expectation_value, to_density};
use crate::core::models::system::MolecularSystem;
use crate::core::potentials::PotentialStrategy;
use nalgebra::DMatrix;
use std::fmt;
use tracing::{debug, info, instrument};

const MIN_GRID_POINTS: usize = 3;
const MAX_PREALLOCATED_STEPS: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorStatus {
    Initialized,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for SimulatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimulatorStatus::Initialized => "initialized",
            SimulatorStatus::Running => "running",
            SimulatorStatus::Completed => "completed",
            SimulatorStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Advances the electronic and nuclear densities of FHF⁻ in lockstep.
///
/// A simulator performs exactly one run, RT-NEO or RT-cNEO, and owns its field, potential
/// and constraint state exclusively for that run.
#[derive(Debug)]
pub struct DynamicsSimulator {
    params: SimulationParameters,
    settings: NumericalSettings,
    system: MolecularSystem,
    field: Box<dyn FieldStrategy>,
    forces: ConstraintForceCalculator,
    electronic: ElectronicModel,
    grid: NuclearGrid,
    status: SimulatorStatus,
}

/// Mutable per-run quantities that are not part of the recorded state.
struct RunContext {
    mode: SimulationMode,
    surface: Vec<f64>,
    static_core: DMatrix<f64>,
    static_fock: DMatrix<f64>,
    static_dipole: DMatrix<f64>,
    electronic_cache: PropagatorCache,
    nuclear_cache: PropagatorCache,
    electronic_guard: StabilityGuard,
    nuclear_guard: StabilityGuard,
    velocity: f64, // In bohr per atomic time unit
    constraint_magnitude_sum: f64,
}

impl DynamicsSimulator {
    pub fn new(
        params: SimulationParameters,
        settings: NumericalSettings,
        system: MolecularSystem,
        field: Box<dyn FieldStrategy>,
        potential: Box<dyn PotentialStrategy>,
    ) -> Result<Self, EngineError> {
        params.validate()?;
        if settings.nuclear_grid_points < MIN_GRID_POINTS {
            return Err(ConfigError::InvalidParameter {
                name: "nuclear_grid_points",
                reason: format!(
                    "at least {} points are required, got {}",
                    MIN_GRID_POINTS, settings.nuclear_grid_points
                ),
            }
            .into());
        }

        let half_distance = system.half_distance();
        Ok(Self {
            forces: ConstraintForceCalculator::new(potential, params.smoothing_time),
            electronic: ElectronicModel::new(half_distance),
            grid: NuclearGrid::new(half_distance, settings.nuclear_grid_points),
            params,
            settings,
            system,
            field,
            status: SimulatorStatus::Initialized,
        })
    }

    pub fn status(&self) -> SimulatorStatus {
        self.status
    }

    pub fn parameters(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn grid(&self) -> &NuclearGrid {
        &self.grid
    }

    pub fn constraint_calculator(&self) -> &ConstraintForceCalculator {
        &self.forces
    }

    pub fn run_rtneo(
        &mut self,
        reporter: &ProgressReporter,
    ) -> Result<SimulationResults, EngineError> {
        self.run(SimulationMode::RtNeo, reporter)
    }

    pub fn run_rtcneo(
        &mut self,
        reporter: &ProgressReporter,
    ) -> Result<SimulationResults, EngineError> {
        self.run(SimulationMode::RtCneo, reporter)
    }

    pub fn run(
        &mut self,
        mode: SimulationMode,
        reporter: &ProgressReporter,
    ) -> Result<SimulationResults, EngineError> {
        if self.status != SimulatorStatus::Initialized {
            return Err(EngineError::InvalidState(self.status));
        }
        self.params.validate_for(mode)?;

        self.status = SimulatorStatus::Running;
        let outcome = self.propagate(mode, reporter);
        self.status = match outcome {
            Ok(_) => SimulatorStatus::Completed,
            Err(_) => SimulatorStatus::Failed,
        };
        outcome
    }

    #[instrument(skip_all, name = "dynamics_run", fields(method = %mode))]
    fn propagate(
        &mut self,
        mode: SimulationMode,
        reporter: &ProgressReporter,
    ) -> Result<SimulationResults, EngineError> {
        let steps = self.params.step_count();
        let dt = self.params.time_step;
        let interval = DynamicsConstants::PROGRESS_REPORT_INTERVAL;
        info!(
            steps,
            time_step = dt,
            max_time = self.params.max_time,
            time_dependent_fock = self.params.use_time_dependent_fock,
            "Starting {} propagation",
            mode
        );

        let x0 = self.system.proton_position();
        let ground = self
            .electronic
            .ground_state(x0, ScfSettings::from(&self.params))?;
        debug!(
            iterations = ground.iterations,
            energy = ground.energy,
            "Initial electronic ground state converged"
        );
        let surface = self.grid.sample_surface(self.forces.potential())?;
        self.forces.reset();

        let mut ctx = RunContext {
            mode,
            surface,
            static_core: self.electronic.core_hamiltonian(x0),
            static_fock: ground.fock,
            static_dipole: self.electronic.dipole_matrix(x0),
            electronic_cache: PropagatorCache::new(),
            nuclear_cache: PropagatorCache::new(),
            electronic_guard: StabilityGuard::new(
                "electronic",
                ACTIVE_ELECTRONS as f64,
                &self.settings,
            ),
            nuclear_guard: StabilityGuard::new("nuclear", 1.0, &self.settings),
            velocity: 0.0,
            constraint_magnitude_sum: 0.0,
        };
        let mut state = DynamicsState::new(
            to_density(&ground.density),
            self.grid
                .gaussian_packet(x0, self.settings.initial_packet_width),
            x0,
        );

        let mut recorder =
            TrajectoryRecorder::with_capacity(mode, steps.min(MAX_PREALLOCATED_STEPS));
        reporter.report(Progress::PhaseStart { name: mode.label() });
        reporter.report(Progress::TaskStart {
            total_steps: steps.div_ceil(interval) as u64,
        });

        for step in 0..steps {
            self.step(&mut ctx, &mut state, step, dt)?;
            recorder.record(&state);

            let done = step + 1;
            if done % interval == 0 || done == steps {
                debug!(
                    step = done,
                    time = state.time,
                    position = state.position,
                    energy = state.energy,
                    "Propagation checkpoint"
                );
                reporter.report(Progress::Checkpoint {
                    step: done,
                    time: state.time,
                    position: state.position,
                });
                reporter.report(Progress::TaskIncrement);
            }
        }

        reporter.report(Progress::TaskFinish);
        reporter.report(Progress::PhaseFinish);

        self.record_diagnostics(&mut recorder, &ctx, steps, ground.iterations);
        let results = recorder.finish();
        info!(
            final_position = results.final_position().unwrap_or(state.position),
            crossings = results.count_barrier_crossings(),
            "{} propagation finished",
            mode
        );
        Ok(results)
    }

    /// Advances `state` from `step·dt` to `(step + 1)·dt`.
    fn step(
        &mut self,
        ctx: &mut RunContext,
        state: &mut DynamicsState,
        step: usize,
        dt: f64,
    ) -> Result<(), EngineError> {
        let t = step as f64 * dt;
        let field = self.field.calculate_field(t + 0.5 * dt);
        let field_end = self.field.calculate_field(t + dt);
        let coupling = DynamicsConstants::CONSTRAINT_COUPLING;

        let (quantum_force, constraint_force) = match ctx.mode {
            SimulationMode::RtNeo => (0.0, 0.0),
            SimulationMode::RtCneo => self
                .forces
                .calculate_constraint_force(state.position, dt)?,
        };

        // Electronic density under the instantaneous Fock matrix and dipole coupling.
        let (core, fock, dipole) = if self.params.use_time_dependent_fock {
            let core = self.electronic.core_hamiltonian(state.position);
            let fock = self
                .electronic
                .fock_from_density(&core, &state.electronic_density);
            (core, fock, self.electronic.dipole_matrix(state.position))
        } else {
            (
                ctx.static_core.clone(),
                ctx.static_fock.clone(),
                ctx.static_dipole.clone(),
            )
        };
        let field_coupling = self.settings.field_coupling_factor;
        let electronic_h = &fock + &dipole * (field_coupling * field);
        let u_el = ctx
            .electronic_cache
            .propagator(&electronic_h, dt)
            .ok_or_else(|| non_finite(Subsystem::Electronic, step, state))?;
        let mut electronic_density = evolve(&state.electronic_density, u_el);

        // Nuclear density on the proton grid.
        let xs = self.grid.points_bohr();
        let mut diagonal: Vec<f64> = ctx
            .surface
            .iter()
            .zip(xs)
            .map(|(v, x)| v - field * x - coupling * constraint_force * x)
            .collect();
        if self.params.use_time_dependent_fock {
            let vibronic = self.electronic.parameters().vibronic_coupling;
            for (d, x) in diagonal.iter_mut().zip(self.grid.points()) {
                *d += vibronic
                    * self
                        .electronic
                        .bonding_energy(&state.electronic_density, *x);
            }
        }
        let nuclear_h = self.grid.hamiltonian(&diagonal);
        let u_nuc = ctx
            .nuclear_cache
            .propagator(&nuclear_h, dt)
            .ok_or_else(|| non_finite(Subsystem::Nuclear, step, state))?;
        let mut nuclear_density = evolve(&state.nuclear_density, u_nuc);

        ctx.electronic_guard
            .enforce(&mut electronic_density)
            .map_err(|v| self.instability(v, Subsystem::Electronic, step, state))?;
        ctx.nuclear_guard
            .enforce(&mut nuclear_density)
            .map_err(|v| self.instability(v, Subsystem::Nuclear, step, state))?;

        let position = match ctx.mode {
            SimulationMode::RtNeo => self.grid.position_expectation(&nuclear_density),
            SimulationMode::RtCneo => {
                let driving = quantum_force + field + coupling * constraint_force;
                ctx.velocity += driving / PhysicalConstants::PROTON_MASS * dt;
                ctx.constraint_magnitude_sum += constraint_force.abs();
                state.position + ctx.velocity * dt * PhysicalConstants::BOHR_TO_ANGSTROM
            }
        };

        let mean_x = self.grid.position_expectation_bohr(&nuclear_density);
        let nuclear_energy = expectation_value(&nuclear_density, &nuclear_h)
            + coupling * constraint_force * mean_x
            + (field - field_end) * mean_x;
        let electronic_energy = self.electronic.energy(&core, &electronic_density)
            + field_coupling * field_end * expectation_value(&electronic_density, &dipole);

        state.time = (step + 1) as f64 * dt;
        state.electronic_density = electronic_density;
        state.nuclear_density = nuclear_density;
        state.position = position;
        state.energy = electronic_energy + nuclear_energy;
        state.constraint_force = constraint_force;
        Ok(())
    }

    fn instability(
        &self,
        violation: TraceViolation,
        subsystem: Subsystem,
        step: usize,
        last_state: &DynamicsState,
    ) -> EngineError {
        tracing::error!(
            step,
            %subsystem,
            deviation = violation.deviation,
            limit = violation.limit,
            "Aborting run on numerical instability"
        );
        EngineError::NumericalInstability {
            step,
            subsystem,
            deviation: violation.deviation,
            limit: violation.limit,
            last_state: Box::new(last_state.clone()),
        }
    }

    fn record_diagnostics(
        &self,
        recorder: &mut TrajectoryRecorder,
        ctx: &RunContext,
        steps: usize,
        scf_iterations: usize,
    ) {
        recorder.set_diagnostic("steps", steps as f64);
        recorder.set_diagnostic("grid_points", self.grid.len() as f64);
        recorder.set_diagnostic("initial_scf_iterations", scf_iterations as f64);
        for (name, guard) in [
            ("electronic", &ctx.electronic_guard),
            ("nuclear", &ctx.nuclear_guard),
        ] {
            recorder.set_diagnostic(
                format!("{name}_trace_warnings"),
                guard.soft_violations() as f64,
            );
            recorder.set_diagnostic(
                format!("{name}_floored_eigenvalues"),
                guard.floored_eigenvalues() as f64,
            );
            recorder.set_diagnostic(
                format!("{name}_max_trace_deviation"),
                guard.max_deviation(),
            );
        }
        recorder.set_diagnostic(
            "electronic_propagator_builds",
            ctx.electronic_cache.builds() as f64,
        );
        recorder.set_diagnostic(
            "nuclear_propagator_builds",
            ctx.nuclear_cache.builds() as f64,
        );

        if ctx.mode == SimulationMode::RtCneo && steps > 0 {
            recorder.set_diagnostic(
                "mean_abs_constraint_force",
                ctx.constraint_magnitude_sum / steps as f64,
            );
            recorder.set_diagnostic("smoothing_time", self.params.smoothing_time);
            if let Some(last) = self.forces.history().get_recent(1).first() {
                recorder.set_diagnostic("final_smoothed_force", *last);
            }
        }
        if let Some(stats) = self.forces.potential().statistics() {
            recorder.set_diagnostic("gradient_calls", stats.gradient_calls as f64);
            recorder.set_diagnostic(
                "oracle_energy_evaluations",
                stats.energy_evaluations as f64,
            );
            recorder.set_diagnostic(
                "average_evaluations_per_gradient",
                stats.average_evaluations_per_gradient,
            );
        }
    }
}

fn non_finite(subsystem: Subsystem, step: usize, last_state: &DynamicsState) -> EngineError {
    tracing::error!(step, %subsystem, "Aborting run on a non-finite Hamiltonian");
    EngineError::NonFiniteHamiltonian {
        step,
        subsystem,
        last_state: Box::new(last_state.clone()),
    }
}
