//! Carbon emissions attributed to grid import and generator use.

/// Carbon intensities of the two fossil sources.
///
/// Like the cost model this is a per-step algebraic quantity (W scaled by
/// kg/kWh / 1000), not an energy integral over `dt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionsModel {
    /// Grid carbon intensity (kg CO2 / kWh).
    pub grid_kg_per_kwh: f64,
    /// Generator carbon intensity (kg CO2 / kWh).
    pub generator_kg_per_kwh: f64,
}

impl EmissionsModel {
    pub fn new(grid_kg_per_kwh: f64, generator_kg_per_kwh: f64) -> Self {
        Self {
            grid_kg_per_kwh,
            generator_kg_per_kwh,
        }
    }

    /// Emissions (kg CO2) for one step. Exports earn no credit.
    pub fn emissions_kg(&self, grid_power_w: f64, generator_setpoint_w: f64) -> f64 {
        let grid = grid_power_w.max(0.0) * self.grid_kg_per_kwh / 1000.0;
        let generator = generator_setpoint_w * self.generator_kg_per_kwh / 1000.0;
        grid + generator
    }
}

impl Default for EmissionsModel {
    fn default() -> Self {
        Self::new(0.5, 0.8)
    }
}
