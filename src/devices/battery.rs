use crate::error::InitializationError;
use crate::profile::exogenous::SECONDS_PER_HOUR;

/// Stored energy of the microgrid battery.
///
/// `BatteryState` is the only component that carries state from one step to
/// the next. Integration is explicit zero-order hold: the setpoint is taken
/// as constant over the whole step.
///
/// # Power Convention
/// - Positive setpoint: charging (energy increases)
/// - Negative setpoint: discharging (energy decreases)
///
/// # Examples
///
/// ```
/// use microgrid_twin::devices::BatteryState;
///
/// let mut battery = BatteryState::new(10_000.0, 5_000.0).unwrap();
/// let next = battery.integrate(1_000.0, 3_600.0);
/// assert_eq!(next, 6_000.0);
/// battery.commit(next);
/// assert_eq!(battery.soc(), 60.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryState {
    /// Stored energy in watt-hours.
    energy_wh: f64,

    /// Usable capacity in watt-hours, fixed for the run.
    capacity_wh: f64,
}

impl BatteryState {
    /// Creates a battery holding `energy_wh` of `capacity_wh`.
    ///
    /// # Errors
    ///
    /// Returns an `InitializationError` if capacity is not positive, or the
    /// starting energy is negative or above capacity.
    pub fn new(capacity_wh: f64, energy_wh: f64) -> Result<Self, InitializationError> {
        if !(capacity_wh.is_finite() && capacity_wh > 0.0) {
            return Err(InitializationError::InvalidCapacity(capacity_wh));
        }
        if !energy_wh.is_finite() || energy_wh < 0.0 {
            return Err(InitializationError::NegativeInitialEnergy(energy_wh));
        }
        if energy_wh > capacity_wh {
            return Err(InitializationError::InitialEnergyExceedsCapacity {
                energy_wh,
                capacity_wh,
            });
        }
        Ok(Self {
            energy_wh,
            capacity_wh,
        })
    }

    /// Energy after holding `setpoint_w` for `dt_s` seconds.
    ///
    /// The result is NOT clamped and the state is NOT updated; the caller
    /// checks bounds and then calls [`BatteryState::commit`].
    pub fn integrate(&self, setpoint_w: f64, dt_s: f64) -> f64 {
        self.energy_wh + setpoint_w * dt_s / SECONDS_PER_HOUR
    }

    /// Stores a checked energy value.
    pub fn commit(&mut self, energy_wh: f64) {
        debug_assert!((0.0..=self.capacity_wh).contains(&energy_wh));
        self.energy_wh = energy_wh;
    }

    /// Overwrites stored energy, used on reset.
    pub(crate) fn restore(&mut self, energy_wh: f64) {
        self.energy_wh = energy_wh;
    }

    /// State of charge of an arbitrary energy value, in percent.
    pub fn soc_of(&self, energy_wh: f64) -> f64 {
        energy_wh / self.capacity_wh * 100.0
    }

    /// Current state of charge in percent.
    pub fn soc(&self) -> f64 {
        self.soc_of(self.energy_wh)
    }

    pub fn energy_wh(&self) -> f64 {
        self.energy_wh
    }

    pub fn capacity_wh(&self) -> f64 {
        self.capacity_wh
    }
}
