//! Physical invariant checks applied after every candidate step.

use crate::error::SimulationFault;

/// Checks a candidate battery energy and generator setpoint.
///
/// Returns `None` when both invariants hold. A negative generator setpoint is
/// reported before a battery limit, so `GeneratorAbsorbing` wins whenever
/// both are violated.
///
/// # Arguments
///
/// * `time_s` - Step time, carried into the fault
/// * `battery_energy_wh` - Unclamped energy after integration
/// * `capacity_wh` - Battery capacity
/// * `generator_setpoint_w` - Requested generator output
pub fn check(
    time_s: f64,
    battery_energy_wh: f64,
    capacity_wh: f64,
    generator_setpoint_w: f64,
) -> Option<SimulationFault> {
    if generator_setpoint_w < 0.0 {
        return Some(SimulationFault::GeneratorAbsorbing {
            time_s,
            generator_setpoint_w,
        });
    }
    if battery_energy_wh < 0.0 || battery_energy_wh > capacity_wh {
        return Some(SimulationFault::BatteryLimitViolated {
            time_s,
            energy_wh: battery_energy_wh,
            capacity_wh,
        });
    }
    None
}
