//! Per-step operating cost.

/// Default rate applied to exported power.
pub const DEFAULT_EXPORT_RATE: f64 = 0.05;

/// Cost parameters for grid exchange and generator fuel.
///
/// `total_cost` is algebraic: it is recomputed every step and never
/// accumulated here. Summing over a run is up to the caller (see
/// [`crate::sim::report::RunReport`]).
///
/// The arithmetic keeps the model's literal structure: the import rate is
/// `price / 1000`, the grid term divides by 1000 again, and nothing is scaled
/// by the step duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    /// Fuel cost ($/kWh of fuel energy).
    pub fuel_cost_per_kwh: f64,
    /// Generator efficiency (0..1].
    pub generator_efficiency: f64,
    /// Rate applied when grid power is zero or negative.
    pub export_rate: f64,
}

impl CostModel {
    pub fn new(fuel_cost_per_kwh: f64, generator_efficiency: f64, export_rate: f64) -> Self {
        Self {
            fuel_cost_per_kwh,
            generator_efficiency,
            export_rate,
        }
    }

    /// Grid exchange term for `grid_power_w` at `price_per_kwh`.
    pub fn grid_term(&self, grid_power_w: f64, price_per_kwh: f64) -> f64 {
        let rate = if grid_power_w > 0.0 {
            price_per_kwh / 1000.0
        } else {
            self.export_rate
        };
        grid_power_w * rate / 1000.0
    }

    /// Fuel term for running the generator at `generator_setpoint_w`.
    pub fn generator_term(&self, generator_setpoint_w: f64) -> f64 {
        generator_setpoint_w * self.fuel_cost_per_kwh / self.generator_efficiency / 1000.0
    }

    /// Total step cost.
    pub fn total_cost(
        &self,
        grid_power_w: f64,
        generator_setpoint_w: f64,
        price_per_kwh: f64,
    ) -> f64 {
        self.grid_term(grid_power_w, price_per_kwh) + self.generator_term(generator_setpoint_w)
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::new(0.25, 0.35, DEFAULT_EXPORT_RATE)
    }
}
