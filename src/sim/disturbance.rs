//! Externally injected disturbances: cloud cover, load surges, grid outage.

use serde::{Deserialize, Serialize};

use crate::error::InvalidStepError;

use super::types::ExogenousSample;

/// Scaling applied to the exogenous profiles until the next reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Disturbance {
    /// Cut to solar generation (%, 0 to 100).
    pub solar_reduction_pct: f64,
    /// Increase of household load (%, >= 0).
    pub load_increase_pct: f64,
    /// Grid unavailable; reported as island mode.
    pub grid_outage: bool,
}

impl Disturbance {
    /// No disturbance.
    pub const NONE: Self = Self {
        solar_reduction_pct: 0.0,
        load_increase_pct: 0.0,
        grid_outage: false,
    };

    /// Checks the percentages are in range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStepError::InvalidDisturbance` describing the first
    /// out-of-range field.
    pub fn validate(&self) -> Result<(), InvalidStepError> {
        if !(0.0..=100.0).contains(&self.solar_reduction_pct) {
            return Err(InvalidStepError::InvalidDisturbance(format!(
                "solar_reduction_pct must be in [0, 100], got {}",
                self.solar_reduction_pct
            )));
        }
        if !(self.load_increase_pct.is_finite() && self.load_increase_pct >= 0.0) {
            return Err(InvalidStepError::InvalidDisturbance(format!(
                "load_increase_pct must be >= 0, got {}",
                self.load_increase_pct
            )));
        }
        Ok(())
    }

    /// Applies the scaling to a resolved sample. Price is untouched.
    pub fn apply(&self, sample: ExogenousSample) -> ExogenousSample {
        ExogenousSample {
            solar_w: sample.solar_w * (1.0 - self.solar_reduction_pct / 100.0),
            load_w: sample.load_w * (1.0 + self.load_increase_pct / 100.0),
            price_per_kwh: sample.price_per_kwh,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}
