//! The RT-cNEO constraint signal.
//!
//! A raw quantum force is low-pass filtered by [`ForceSmoother`]; the
//! [`ConstraintForceCalculator`] turns the gap between the filtered and the raw force into a
//! feedback term and keeps recent filtered values in a [`ForceHistory`] for diagnostics.

mod calculator;
mod history;
mod smoother;

pub use calculator::ConstraintForceCalculator;
pub use history::ForceHistory;
pub use smoother::ForceSmoother;
