//! Error and fault types for construction, step validation, and domain faults.

use serde::Serialize;
use thiserror::Error;

/// Rejected construction of a table, battery, or stepper.
///
/// No partial state is left behind when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum InitializationError {
    #[error("time table needs at least two breakpoints, got {len}")]
    TooFewBreakpoints { len: usize },
    #[error("time table has {times} breakpoint times but {values} values")]
    LengthMismatch { times: usize, values: usize },
    #[error("time table breakpoint {index} is not finite")]
    NonFiniteBreakpoint { index: usize },
    #[error(
        "time table breakpoints must be strictly increasing: \
         breakpoint {index} ({current}) follows {previous}"
    )]
    NonMonotonicBreakpoints {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("battery capacity must be > 0 Wh, got {0}")]
    InvalidCapacity(f64),
    #[error("initial battery energy must be >= 0 Wh, got {0}")]
    NegativeInitialEnergy(f64),
    #[error("initial battery energy {energy_wh} Wh exceeds capacity {capacity_wh} Wh")]
    InitialEnergyExceedsCapacity { energy_wh: f64, capacity_wh: f64 },
    #[error("generator efficiency must be in (0, 1], got {0}")]
    InvalidEfficiency(f64),
    #[error("fuel cost must be finite and >= 0, got {0}")]
    InvalidFuelCost(f64),
    #[error("grid export rate must be finite, got {0}")]
    InvalidExportRate(f64),
    #[error("{field} must be finite and >= 0 kg/kWh, got {value}")]
    InvalidCarbonIntensity { field: &'static str, value: f64 },
    #[error("reliability {field} out of range: {value}")]
    InvalidReliabilityThreshold { field: &'static str, value: f64 },
    #[error("profile CSV: {0}")]
    ProfileCsv(String),
}

/// A step call rejected before any state mutation.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum InvalidStepError {
    #[error("dt must be > 0 s, got {0}")]
    NonPositiveDt(f64),
    #[error("step input `{field}` is not finite")]
    NonFiniteInput { field: &'static str },
    #[error("time must increase between steps: {current} s follows {previous} s")]
    NonIncreasingTime { previous: f64, current: f64 },
    #[error("disturbance rejected: {0}")]
    InvalidDisturbance(String),
}

/// Violation of a physical invariant. Fatal for the run until `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimulationFault {
    #[error(
        "battery energy {energy_wh} Wh outside [0, {capacity_wh}] Wh at t={time_s} s"
    )]
    BatteryLimitViolated {
        time_s: f64,
        energy_wh: f64,
        capacity_wh: f64,
    },
    #[error("generator setpoint {generator_setpoint_w} W is negative at t={time_s} s")]
    GeneratorAbsorbing {
        time_s: f64,
        generator_setpoint_w: f64,
    },
}

impl SimulationFault {
    /// Short machine-readable name of the fault kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BatteryLimitViolated { .. } => "battery_limit_violated",
            Self::GeneratorAbsorbing { .. } => "generator_absorbing",
        }
    }
}

/// Everything `SimulationStepper::step` can return instead of an output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    /// The call itself was malformed; state is unchanged.
    #[error(transparent)]
    Invalid(#[from] InvalidStepError),
    /// This step violated an invariant; the stepper is now faulted.
    #[error("simulation fault: {0}")]
    Fault(SimulationFault),
    /// The stepper faulted earlier and has not been reset.
    #[error("stepper is faulted ({0}); call reset() before stepping")]
    Faulted(SimulationFault),
    /// The stepper was stopped and has not been reset.
    #[error("stepper is stopped; call reset() before stepping")]
    Stopped,
}

impl StepError {
    /// Returns the fault carried by this error, if any.
    pub fn fault(&self) -> Option<&SimulationFault> {
        match self {
            Self::Fault(f) | Self::Faulted(f) => Some(f),
            _ => None,
        }
    }
}
