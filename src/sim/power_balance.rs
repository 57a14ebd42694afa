//! Grid power balance.

/// Computes grid exchange from load, solar, and the two setpoints.
///
/// Sign convention:
/// - Positive result = import from grid
/// - Negative result = export to grid
///
/// A positive battery setpoint (charging) is treated as supply to the bus, the
/// same way the generator setpoint is; both are subtracted from the residual
/// load.
///
/// # Arguments
///
/// * `load_w` - Household load (W, positive)
/// * `solar_w` - Solar generation (W, positive)
/// * `battery_setpoint_w` - Battery setpoint (W)
/// * `generator_setpoint_w` - Generator setpoint (W)
///
/// # Returns
///
/// Grid power in W (positive=import, negative=export)
pub fn grid_power_w(
    load_w: f64,
    solar_w: f64,
    battery_setpoint_w: f64,
    generator_setpoint_w: f64,
) -> f64 {
    load_w - solar_w - battery_setpoint_w - generator_setpoint_w
}
