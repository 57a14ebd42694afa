//! Time-indexed exogenous profiles: interpolation tables and the signal set.

/// Solar, load, and price signals keyed by wall-clock seconds.
pub mod exogenous;
/// Piecewise-linear breakpoint tables.
pub mod time_table;

pub use exogenous::ExogenousSignals;
pub use time_table::{ExtrapolationPolicy, TimeTable};
