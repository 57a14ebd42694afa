//! Lockstep loop between an external controller and the stepper.

use serde::Serialize;
use tracing::info;

use crate::error::{SimulationFault, StepError};

use super::clock::Clock;
use super::reliability::ReliabilityStatus;
use super::stepper::SimulationStepper;
use super::types::{ExogenousSample, StepInput, StepOutput};

/// What a controller sees before choosing setpoints.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    /// Time of the step about to run (s).
    pub time_s: f64,
    /// Duration of the step about to run (s).
    pub dt_s: f64,
    /// Current state of charge (%).
    pub battery_soc: f64,
    /// Exogenous values the step will use.
    pub sample: ExogenousSample,
    /// Output of the previous step, if any.
    pub last_output: Option<StepOutput>,
}

/// Setpoints chosen for one step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Setpoints {
    /// Battery setpoint (W; positive=charge).
    pub battery_w: f64,
    /// Generator setpoint (W).
    pub generator_w: f64,
}

/// A control policy driven in lockstep with the stepper.
///
/// Closures `FnMut(&Observation) -> Setpoints` implement this trait.
pub trait Controller {
    /// Chooses setpoints for the step described by `observation`.
    fn setpoints(&mut self, observation: &Observation) -> Setpoints;
}

impl<F> Controller for F
where
    F: FnMut(&Observation) -> Setpoints,
{
    fn setpoints(&mut self, observation: &Observation) -> Setpoints {
        self(observation)
    }
}

/// One completed step with its derived indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepRecord {
    pub input: StepInput,
    pub output: StepOutput,
    /// Emissions of this step (kg CO2).
    pub emissions_kg: f64,
    pub reliability: ReliabilityStatus,
}

/// Result of a lockstep run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Records of every successful step, in order.
    pub records: Vec<StepRecord>,
    /// Why the run ended early, if it did.
    pub error: Option<StepError>,
}

impl RunOutcome {
    /// Sum of per-step cost over the run ($).
    pub fn total_cost(&self) -> f64 {
        self.records.iter().map(|r| r.output.total_cost).sum()
    }

    /// The fault that ended the run, if any.
    pub fn fault(&self) -> Option<&SimulationFault> {
        self.error.as_ref().and_then(StepError::fault)
    }

    pub fn completed(&self) -> bool {
        self.error.is_none()
    }
}

/// Derives emissions and reliability for a completed step.
pub fn record_step(
    stepper: &SimulationStepper,
    input: StepInput,
    output: StepOutput,
) -> StepRecord {
    let config = stepper.config();
    StepRecord {
        input,
        output,
        emissions_kg: config
            .emissions_model()
            .emissions_kg(output.grid_power, input.generator_setpoint_w),
        reliability: config.reliability_policy().classify(
            output.grid_power,
            output.battery_soc,
            input.generator_setpoint_w,
            stepper.disturbance().grid_outage,
        ),
    }
}

/// Drives `stepper` with `controller` for every tick of `clock`.
///
/// Stops at the first error (fail-stop); the stepper is left in whatever
/// state that error put it in.
pub fn run_lockstep<C: Controller>(
    stepper: &mut SimulationStepper,
    controller: &mut C,
    mut clock: Clock,
) -> RunOutcome {
    let mut records = Vec::new();
    let mut last_output = None;

    while let Some((time_s, dt_s)) = clock.tick() {
        let observation = Observation {
            time_s,
            dt_s,
            battery_soc: stepper.battery().soc(),
            sample: stepper.sample(time_s),
            last_output,
        };
        let setpoints = controller.setpoints(&observation);
        let input = StepInput::new(time_s, dt_s, setpoints.battery_w, setpoints.generator_w);

        match stepper.step(input) {
            Ok(output) => {
                records.push(record_step(stepper, input, output));
                last_output = Some(output);
            }
            Err(e) => {
                info!(steps = records.len(), error = %e, "lockstep run ended early");
                return RunOutcome {
                    records,
                    error: Some(e),
                };
            }
        }
    }

    RunOutcome {
        records,
        error: None,
    }
}
