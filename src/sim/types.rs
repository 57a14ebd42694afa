//! Step contract types exchanged with the controller.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Setpoints and timing supplied by the controller for one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepInput {
    /// Wall-clock time of the step (s). Must increase between calls.
    pub time_s: f64,
    /// Step duration (s, > 0).
    pub dt_s: f64,
    /// Battery setpoint (W; positive=charge, negative=discharge).
    pub battery_setpoint_w: f64,
    /// Generator setpoint (W, >= 0).
    pub generator_setpoint_w: f64,
}

impl StepInput {
    pub fn new(time_s: f64, dt_s: f64, battery_setpoint_w: f64, generator_setpoint_w: f64) -> Self {
        Self {
            time_s,
            dt_s,
            battery_setpoint_w,
            generator_setpoint_w,
        }
    }
}

/// Measurements and cost reported back after a successful step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepOutput {
    /// Battery state of charge after the step (%).
    pub battery_soc: f64,
    /// Solar generation (W).
    pub solar_power: f64,
    /// Household load (W).
    pub load_power: f64,
    /// Grid exchange (W; positive=import, negative=export).
    pub grid_power: f64,
    /// Cost of this step ($). Not cumulative.
    pub total_cost: f64,
}

impl fmt::Display for StepOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SoC={:>5.1}% | solar={:>7.1} W  load={:>7.1} W  grid={:>8.1} W | cost={:.6}",
            self.battery_soc, self.solar_power, self.load_power, self.grid_power, self.total_cost,
        )
    }
}

/// Exogenous values resolved for one step, after any disturbance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExogenousSample {
    pub solar_w: f64,
    pub load_w: f64,
    pub price_per_kwh: f64,
}
