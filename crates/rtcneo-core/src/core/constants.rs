use serde::{Deserialize, Serialize};

/// Unit conversions and particle masses in atomic units.
pub struct PhysicalConstants;

impl PhysicalConstants {
    pub const BOHR_TO_ANGSTROM: f64 = 0.529177;
    pub const ANGSTROM_TO_BOHR: f64 = 1.0 / Self::BOHR_TO_ANGSTROM;
    pub const PROTON_MASS: f64 = 1836.15; // In electron masses
    pub const HARTREE_TO_EV: f64 = 27.2114;
    pub const FEMTOSECOND_TO_AU: f64 = 41.341;
}

/// Coefficients of the symmetric double well `V(x) = a·x⁴ − b·x² + c·exp(−d·x²)`,
/// with `x` in Ångström and `V` in Hartree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PotentialParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for PotentialParameters {
    fn default() -> Self {
        Self {
            a: 0.1,
            b: 0.05,
            c: 0.02,
            d: 10.0,
        }
    }
}

/// Fixed parameters of the time-stepping loop and the constraint machinery.
pub struct DynamicsConstants;

impl DynamicsConstants {
    pub const RAMP_TIME: f64 = 50.0;
    pub const PULSE_CENTER: f64 = 50.0;
    pub const PULSE_WIDTH: f64 = 20.0;
    pub const MAX_FORCE_HISTORY: usize = 100;
    pub const CONSTRAINT_FORCE_MULTIPLIER: f64 = 2.0;
    /// Fraction of the constraint force fed back into the equations of motion.
    /// With the default multiplier the classical driving force becomes the smoothed force.
    pub const CONSTRAINT_COUPLING: f64 = 0.5;
    pub const TRANSFER_THRESHOLD: f64 = 0.3; // In Å
    pub const PROGRESS_REPORT_INTERVAL: usize = 100;
    /// Longest run accepted by parameter validation.
    pub const MAX_STEPS: usize = 10_000_000;
    pub const FINITE_DIFFERENCE_STEP: f64 = 1e-3; // In Å
    pub const INITIAL_PROTON_POSITION: f64 = -0.15; // In Å
}

/// Tunable numerical settings of the propagation and its stability guards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericalSettings {
    /// Smallest eigenvalue a density matrix may carry after a step.
    pub eigenvalue_floor: f64,
    /// Soft tolerance on the deviation of a density trace from its particle count.
    pub trace_tolerance: f64,
    /// Multiple of `trace_tolerance` beyond which a run is aborted.
    pub hard_tolerance_ratio: f64,
    /// Scale of the field coupling into the electronic Fock matrix.
    pub field_coupling_factor: f64,
    /// Number of interior points of the proton grid.
    pub nuclear_grid_points: usize,
    /// Width of the initial proton wave packet, in Å.
    pub initial_packet_width: f64,
}

impl Default for NumericalSettings {
    fn default() -> Self {
        Self {
            eigenvalue_floor: 1e-14,
            trace_tolerance: 1e-10,
            hard_tolerance_ratio: 1e6,
            field_coupling_factor: 0.01,
            nuclear_grid_points: 64,
            initial_packet_width: 0.1,
        }
    }
}

impl NumericalSettings {
    pub fn hard_trace_tolerance(&self) -> f64 {
        self.trace_tolerance * self.hard_tolerance_ratio
    }
}
