//! Shared test fixtures for integration tests.

use std::sync::Arc;

use microgrid_twin::config::MicrogridConfig;
use microgrid_twin::profile::ExogenousSignals;
use microgrid_twin::sim::stepper::SimulationStepper;
use microgrid_twin::sim::types::StepInput;

/// One hour (s).
pub const HOUR: f64 = 3600.0;

/// Stepper on the reference microgrid (10 kWh battery at 50%).
pub fn reference_stepper() -> SimulationStepper {
    SimulationStepper::from_config(MicrogridConfig::reference()).unwrap()
}

/// Reference tables behind an `Arc`, for steppers that share them.
pub fn shared_signals() -> Arc<ExogenousSignals> {
    Arc::new(ExogenousSignals::reference())
}

/// Hourly steps with a repeating battery pattern that stays within bounds
/// of a half-charged 10 kWh battery.
pub fn hourly_inputs(hours: usize) -> Vec<StepInput> {
    const PATTERN: [f64; 4] = [1000.0, 500.0, -1500.0, 0.0];
    (0..hours)
        .map(|h| StepInput::new(h as f64 * HOUR, HOUR, PATTERN[h % PATTERN.len()], 0.0))
        .collect()
}
