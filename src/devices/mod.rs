//! Stateful physical devices of the microgrid.

/// Battery energy storage integrated at the controller cadence.
pub mod battery;

pub use battery::BatteryState;
