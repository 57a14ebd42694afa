/// Upper bound on ticks produced by [`Clock::days`].
pub const MAX_TICKS: usize = u32::MAX as usize;

/// A fixed-cadence wall clock for driving the stepper in lockstep.
///
/// The stepper has no clock of its own; this produces the increasing
/// `time_s` values a controller loop hands to it.
///
/// # Examples
///
/// ```
/// use microgrid_twin::sim::clock::Clock;
///
/// let mut clock = Clock::new(0.0, 300.0, 3);
/// let mut times = Vec::new();
///
/// clock.run(|time_s, _dt_s| times.push(time_s));
/// assert_eq!(times, vec![0.0, 300.0, 600.0]);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    /// Time of the first tick (s)
    start_s: f64,
    /// Step duration (s)
    dt_s: f64,
    /// Ticks already produced
    current: usize,
    /// Total ticks to produce
    total: usize,
}

impl Clock {
    /// Creates a clock ticking `total` times every `dt_s` seconds from `start_s`.
    ///
    /// # Arguments
    ///
    /// * `start_s` - Time of the first tick
    /// * `dt_s` - Step duration
    /// * `total` - Number of ticks
    pub fn new(start_s: f64, dt_s: f64, total: usize) -> Self {
        Self {
            start_s,
            dt_s,
            current: 0,
            total,
        }
    }

    /// A clock covering `days` whole days at `dt_s` cadence, starting at midnight.
    ///
    /// The tick count is capped at [`MAX_TICKS`]; use [`Clock::try_days`] to
    /// reject such a cadence instead.
    pub fn days(days: usize, dt_s: f64) -> Self {
        Self::try_days(days, dt_s).unwrap_or_else(|| Self::new(0.0, dt_s, MAX_TICKS))
    }

    /// Like [`Clock::days`], but `None` when `dt_s` is not a positive finite
    /// number or the run would need more than [`MAX_TICKS`] ticks.
    pub fn try_days(days: usize, dt_s: f64) -> Option<Self> {
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return None;
        }
        let total = (days as f64 * 86_400.0 / dt_s).round();
        if !(total <= MAX_TICKS as f64) {
            return None;
        }
        Some(Self::new(0.0, dt_s, total as usize))
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some((time_s, dt_s))` - The tick time, computed from the index so
    ///   no rounding error accumulates
    /// * `None` - If the clock has produced all its ticks
    pub fn tick(&mut self) -> Option<(f64, f64)> {
        if self.current < self.total {
            let time_s = self.start_s + self.current as f64 * self.dt_s;
            self.current += 1;
            Some((time_s, self.dt_s))
        } else {
            None
        }
    }

    /// Runs a function for each remaining tick.
    pub fn run(&mut self, mut f: impl FnMut(f64, f64)) {
        while let Some((time_s, dt_s)) = self.tick() {
            f(time_s, dt_s);
        }
    }

    pub fn dt_s(&self) -> f64 {
        self.dt_s
    }

    /// Ticks left to produce.
    pub fn remaining(&self) -> usize {
        self.total - self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clock() {
        let clock = Clock::new(0.0, 60.0, 5);
        assert_eq!(clock.current, 0);
        assert_eq!(clock.total, 5);
        assert_eq!(clock.remaining(), 5);
    }

    #[test]
    fn test_tick() {
        let mut clock = Clock::new(100.0, 50.0, 2);
        assert_eq!(clock.tick(), Some((100.0, 50.0)));
        assert_eq!(clock.tick(), Some((150.0, 50.0)));
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn test_days() {
        let clock = Clock::days(2, 900.0);
        assert_eq!(clock.remaining(), 192);
    }

    #[test]
    fn test_days_caps_tiny_cadence() {
        assert!(Clock::try_days(1, 1e-300).is_none());
        assert!(Clock::try_days(1, 0.0).is_none());
        assert!(Clock::try_days(1, f64::NAN).is_none());
        assert_eq!(Clock::days(1, 1e-300).remaining(), MAX_TICKS);
        assert_eq!(Clock::try_days(1, 1.0).map(|c| c.remaining()), Some(86_400));
    }

    #[test]
    fn test_empty_clock() {
        let mut clock = Clock::new(0.0, 1.0, 0);
        assert_eq!(clock.tick(), None);

        let mut was_called = false;
        clock.run(|_, _| was_called = true);
        assert!(!was_called);
    }
}
