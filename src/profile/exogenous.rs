use super::time_table::{ExtrapolationPolicy, TimeTable};

/// Seconds per hour; tables are authored in hours, lookups arrive in seconds.
pub const SECONDS_PER_HOUR: f64 = 3600.0;

const SOLAR_HOURS: [f64; 7] = [0.0, 6.0, 7.0, 12.0, 18.0, 20.0, 24.0];
const SOLAR_W: [f64; 7] = [0.0, 0.0, 500.0, 4000.0, 1000.0, 0.0, 0.0];

const LOAD_HOURS: [f64; 7] = [0.0, 6.0, 8.0, 12.0, 17.0, 22.0, 24.0];
const LOAD_W: [f64; 7] = [800.0, 600.0, 400.0, 800.0, 3500.0, 1200.0, 800.0];

const PRICE_HOURS: [f64; 5] = [0.0, 8.0, 18.0, 22.0, 24.0];
const PRICE_PER_KWH: [f64; 5] = [0.12, 0.15, 0.20, 0.15, 0.12];

/// Solar, load, and price profiles resolved at wall-clock time.
///
/// Breakpoints are in hours; every lookup takes seconds and divides by
/// [`SECONDS_PER_HOUR`] before interpolating. The struct is immutable, so one
/// instance behind an `Arc` can feed any number of simulations.
#[derive(Debug, Clone, PartialEq)]
pub struct ExogenousSignals {
    solar: TimeTable,
    load: TimeTable,
    price: TimeTable,
    policy: ExtrapolationPolicy,
}

impl ExogenousSignals {
    /// Wraps caller-supplied tables (W, W, $/kWh over hours).
    pub fn new(
        solar: TimeTable,
        load: TimeTable,
        price: TimeTable,
        policy: ExtrapolationPolicy,
    ) -> Self {
        Self {
            solar,
            load,
            price,
            policy,
        }
    }

    /// The built-in one-day residential profiles with flat extrapolation.
    pub fn reference() -> Self {
        Self::new(
            reference_solar(),
            reference_load(),
            reference_price(),
            ExtrapolationPolicy::Clamp,
        )
    }

    /// Returns a copy using a different extrapolation policy.
    pub fn with_policy(mut self, policy: ExtrapolationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Solar generation (W) at `time_s`.
    pub fn solar_at(&self, time_s: f64) -> f64 {
        self.solar.sample(time_s / SECONDS_PER_HOUR, self.policy)
    }

    /// Household load (W) at `time_s`.
    pub fn load_at(&self, time_s: f64) -> f64 {
        self.load.sample(time_s / SECONDS_PER_HOUR, self.policy)
    }

    /// Grid import price ($/kWh) at `time_s`.
    pub fn price_at(&self, time_s: f64) -> f64 {
        self.price.sample(time_s / SECONDS_PER_HOUR, self.policy)
    }

    pub fn policy(&self) -> ExtrapolationPolicy {
        self.policy
    }

    pub fn solar(&self) -> &TimeTable {
        &self.solar
    }

    pub fn load(&self) -> &TimeTable {
        &self.load
    }

    pub fn price(&self) -> &TimeTable {
        &self.price
    }
}

impl Default for ExogenousSignals {
    fn default() -> Self {
        Self::reference()
    }
}

/// Reference solar profile: dark until 06:00, peak 4 kW at noon.
pub fn reference_solar() -> TimeTable {
    TimeTable::from_static(&SOLAR_HOURS, &SOLAR_W)
}

/// Reference load profile: evening peak of 3.5 kW at 17:00.
pub fn reference_load() -> TimeTable {
    TimeTable::from_static(&LOAD_HOURS, &LOAD_W)
}

/// Reference time-of-use price, highest between 18:00 and 22:00.
pub fn reference_price() -> TimeTable {
    TimeTable::from_static(&PRICE_HOURS, &PRICE_PER_KWH)
}
