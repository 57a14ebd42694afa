//! API request and response bodies.

use serde::{Deserialize, Serialize};

use crate::error::SimulationFault;
use crate::sim::disturbance::Disturbance;
use crate::sim::driver::StepRecord;
use crate::sim::reliability::ReliabilityStatus;
use crate::sim::report::{RunReport, SystemHealth};
use crate::sim::stepper::{SimulationStepper, StepperState};
use crate::sim::types::StepOutput;

/// Snapshot of the stepper between steps.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    /// Lifecycle state, with the fault when faulted.
    pub stepper: StepperState,
    /// Battery state of charge (%).
    pub battery_soc: f64,
    pub energy_wh: f64,
    pub capacity_wh: f64,
    /// Time of the last accepted step since reset.
    pub last_time_s: Option<f64>,
    /// Disturbance currently in effect.
    pub disturbance: Disturbance,
    /// Steps recorded since reset.
    pub steps: usize,
}

impl StateResponse {
    pub fn from_stepper(stepper: &SimulationStepper, steps: usize) -> Self {
        let battery = stepper.battery();
        Self {
            stepper: stepper.state(),
            battery_soc: battery.soc(),
            energy_wh: battery.energy_wh(),
            capacity_wh: battery.capacity_wh(),
            last_time_s: stepper.last_time_s(),
            disturbance: stepper.disturbance(),
            steps,
        }
    }
}

/// Result of one accepted step.
#[derive(Debug, Serialize)]
pub struct StepResponse {
    #[serde(flatten)]
    pub output: StepOutput,
    /// Emissions of this step (kg CO2).
    pub emissions_kg: f64,
    pub reliability: ReliabilityStatus,
}

impl From<&StepRecord> for StepResponse {
    fn from(r: &StepRecord) -> Self {
        Self {
            output: r.output,
            emissions_kg: r.emissions_kg,
            reliability: r.reliability,
        }
    }
}

/// Run totals plus the health verdict over recent steps.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: RunReport,
    pub health: SystemHealth,
}

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// First record index (inclusive).
    pub from: Option<usize>,
    /// Last record index (inclusive).
    pub to: Option<usize>,
}

/// Error body for 4xx responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// The fault behind a 409, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<SimulationFault>,
}
