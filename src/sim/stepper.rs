//! Simulation stepper: one deterministic lockstep step per controller call.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::MicrogridConfig;
use crate::devices::BatteryState;
use crate::error::{InitializationError, InvalidStepError, SimulationFault, StepError};
use crate::profile::ExogenousSignals;

use super::constraints;
use super::cost::CostModel;
use super::disturbance::Disturbance;
use super::power_balance::grid_power_w;
use super::types::{ExogenousSample, StepInput, StepOutput};

/// Lifecycle of a [`SimulationStepper`].
///
/// A stepper only exists once construction succeeded, so it starts in
/// `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "fault", rename_all = "snake_case")]
pub enum StepperState {
    /// Constructed or reset, no step taken yet.
    Ready,
    /// At least one step succeeded since the last reset.
    Stepping,
    /// A step violated an invariant; only `reset` is accepted.
    Faulted(SimulationFault),
    /// Stopped by the caller; only `reset` is accepted.
    Stopped,
}

impl fmt::Display for StepperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => f.write_str("ready"),
            Self::Stepping => f.write_str("stepping"),
            Self::Faulted(fault) => write!(f, "faulted ({})", fault.kind()),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}

/// Orchestrates one microgrid step from controller setpoints.
///
/// Per step, in this order: exogenous lookups, battery integration, power
/// balance, cost, invariant check. The battery energy is only committed
/// when the check passes, so `0 <= energy <= capacity` holds whenever the
/// stepper can be observed.
///
/// Calls must be sequential: `step` takes `&mut self`. The exogenous signals
/// are behind an `Arc` and may be shared by steppers on other threads.
#[derive(Debug, Clone)]
pub struct SimulationStepper {
    config: MicrogridConfig,
    signals: Arc<ExogenousSignals>,
    cost: CostModel,
    battery: BatteryState,
    state: StepperState,
    last_time_s: Option<f64>,
    disturbance: Disturbance,
}

impl SimulationStepper {
    /// Builds a stepper from configuration, including its profile tables.
    ///
    /// # Errors
    ///
    /// Returns an `InitializationError` if a table is malformed or a scalar
    /// parameter is out of range.
    pub fn from_config(config: MicrogridConfig) -> Result<Self, InitializationError> {
        let signals = Arc::new(config.build_signals()?);
        Self::new(config, signals)
    }

    /// Builds a stepper that reads caller-supplied signals.
    ///
    /// The profile section of `config` is ignored; `signals` is used as is.
    ///
    /// # Errors
    ///
    /// Returns an `InitializationError` if a battery, generator, grid, or
    /// reliability parameter is out of range.
    pub fn new(
        config: MicrogridConfig,
        signals: Arc<ExogenousSignals>,
    ) -> Result<Self, InitializationError> {
        let battery = BatteryState::new(
            config.battery.capacity_wh,
            config.battery.initial_energy_wh,
        )?;

        check_parameters(&config)?;

        info!(
            capacity_wh = battery.capacity_wh(),
            initial_energy_wh = battery.energy_wh(),
            extrapolation = ?signals.policy(),
            "simulation stepper ready"
        );

        Ok(Self {
            cost: config.cost_model(),
            config,
            signals,
            battery,
            state: StepperState::Ready,
            last_time_s: None,
            disturbance: Disturbance::NONE,
        })
    }

    /// Advances the model by one step.
    ///
    /// # Errors
    ///
    /// - `StepError::Invalid` for a malformed call; nothing changes.
    /// - `StepError::Fault` when this step breaks an invariant; the stepper
    ///   moves to `Faulted` and the battery keeps its previous energy.
    /// - `StepError::Faulted` / `StepError::Stopped` when the stepper is not
    ///   accepting steps.
    pub fn step(&mut self, input: StepInput) -> Result<StepOutput, StepError> {
        match self.state {
            StepperState::Faulted(fault) => return Err(StepError::Faulted(fault)),
            StepperState::Stopped => return Err(StepError::Stopped),
            StepperState::Ready | StepperState::Stepping => {}
        }

        if let Err(e) = self.validate(&input) {
            warn!(time_s = input.time_s, error = %e, "step rejected");
            return Err(e.into());
        }

        // 1. Exogenous lookups
        let sample = self.sample(input.time_s);

        // 2. Battery integration (unclamped)
        let energy_wh = self
            .battery
            .integrate(input.battery_setpoint_w, input.dt_s);

        // 3. Power balance
        let grid_power = grid_power_w(
            sample.load_w,
            sample.solar_w,
            input.battery_setpoint_w,
            input.generator_setpoint_w,
        );

        // 4. Cost
        let total_cost = self.cost.total_cost(
            grid_power,
            input.generator_setpoint_w,
            sample.price_per_kwh,
        );

        // 5. Invariants
        if let Some(fault) = constraints::check(
            input.time_s,
            energy_wh,
            self.battery.capacity_wh(),
            input.generator_setpoint_w,
        ) {
            warn!(time_s = input.time_s, %fault, "simulation faulted");
            self.state = StepperState::Faulted(fault);
            return Err(StepError::Fault(fault));
        }

        self.battery.commit(energy_wh);
        self.last_time_s = Some(input.time_s);
        self.state = StepperState::Stepping;

        let output = StepOutput {
            battery_soc: self.battery.soc(),
            solar_power: sample.solar_w,
            load_power: sample.load_w,
            grid_power,
            total_cost,
        };
        debug!(
            time_s = input.time_s,
            soc = output.battery_soc,
            grid_w = output.grid_power,
            cost = output.total_cost,
            "step"
        );
        Ok(output)
    }

    /// Returns to `Ready` with the configured initial energy.
    ///
    /// Valid from any state. Also clears any disturbance and restarts the
    /// time monotonicity check.
    pub fn reset(&mut self) {
        self.battery.restore(self.config.battery.initial_energy_wh);
        self.state = StepperState::Ready;
        self.last_time_s = None;
        self.disturbance = Disturbance::NONE;
        info!(energy_wh = self.battery.energy_wh(), "simulation reset");
    }

    /// Ends the run; further steps are rejected until `reset`.
    pub fn stop(&mut self) {
        if !matches!(self.state, StepperState::Faulted(_)) {
            self.state = StepperState::Stopped;
            info!("simulation stopped");
        }
    }

    /// Applies `disturbance` to every following step until `reset`.
    ///
    /// Replaces any earlier disturbance.
    ///
    /// # Errors
    ///
    /// Returns `StepError::Invalid` for out-of-range percentages and
    /// `StepError::Faulted` / `StepError::Stopped` when not accepting steps.
    pub fn inject_disturbance(&mut self, disturbance: Disturbance) -> Result<(), StepError> {
        match self.state {
            StepperState::Faulted(fault) => return Err(StepError::Faulted(fault)),
            StepperState::Stopped => return Err(StepError::Stopped),
            StepperState::Ready | StepperState::Stepping => {}
        }
        disturbance.validate()?;
        info!(
            solar_reduction_pct = disturbance.solar_reduction_pct,
            load_increase_pct = disturbance.load_increase_pct,
            grid_outage = disturbance.grid_outage,
            "disturbance injected"
        );
        self.disturbance = disturbance;
        Ok(())
    }

    /// Exogenous values the next step at `time_s` would see.
    pub fn sample(&self, time_s: f64) -> ExogenousSample {
        self.disturbance.apply(ExogenousSample {
            solar_w: self.signals.solar_at(time_s),
            load_w: self.signals.load_at(time_s),
            price_per_kwh: self.signals.price_at(time_s),
        })
    }

    fn validate(&self, input: &StepInput) -> Result<(), InvalidStepError> {
        let fields = [
            ("time_s", input.time_s),
            ("dt_s", input.dt_s),
            ("battery_setpoint_w", input.battery_setpoint_w),
            ("generator_setpoint_w", input.generator_setpoint_w),
        ];
        if let Some(&(field, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(InvalidStepError::NonFiniteInput { field });
        }
        if input.dt_s <= 0.0 {
            return Err(InvalidStepError::NonPositiveDt(input.dt_s));
        }
        if let Some(previous) = self.last_time_s {
            if input.time_s <= previous {
                return Err(InvalidStepError::NonIncreasingTime {
                    previous,
                    current: input.time_s,
                });
            }
        }
        Ok(())
    }

    pub fn state(&self) -> StepperState {
        self.state
    }

    pub fn battery(&self) -> &BatteryState {
        &self.battery
    }

    pub fn config(&self) -> &MicrogridConfig {
        &self.config
    }

    pub fn signals(&self) -> &Arc<ExogenousSignals> {
        &self.signals
    }

    pub fn disturbance(&self) -> Disturbance {
        self.disturbance
    }

    /// Time of the last successful step since construction or reset.
    pub fn last_time_s(&self) -> Option<f64> {
        self.last_time_s
    }
}

/// Generator, grid, and reliability parameters must be finite and in range.
fn check_parameters(config: &MicrogridConfig) -> Result<(), InitializationError> {
    let generator = &config.generator;
    if !(generator.efficiency > 0.0 && generator.efficiency <= 1.0) {
        return Err(InitializationError::InvalidEfficiency(generator.efficiency));
    }
    if !(generator.fuel_cost_per_kwh.is_finite() && generator.fuel_cost_per_kwh >= 0.0) {
        return Err(InitializationError::InvalidFuelCost(
            generator.fuel_cost_per_kwh,
        ));
    }
    if !config.grid.export_rate.is_finite() {
        return Err(InitializationError::InvalidExportRate(config.grid.export_rate));
    }

    let intensities = [
        (
            "grid.carbon_intensity_kg_per_kwh",
            config.grid.carbon_intensity_kg_per_kwh,
        ),
        (
            "generator.carbon_intensity_kg_per_kwh",
            generator.carbon_intensity_kg_per_kwh,
        ),
    ];
    for (field, value) in intensities {
        if !(value.is_finite() && value >= 0.0) {
            return Err(InitializationError::InvalidCarbonIntensity { field, value });
        }
    }

    let rel = &config.reliability;
    if rel.grid_dependency_threshold_w.is_nan() {
        return Err(InitializationError::InvalidReliabilityThreshold {
            field: "grid_dependency_threshold_w",
            value: rel.grid_dependency_threshold_w,
        });
    }
    if !(0.0..=100.0).contains(&rel.min_soc_pct) {
        return Err(InitializationError::InvalidReliabilityThreshold {
            field: "min_soc_pct",
            value: rel.min_soc_pct,
        });
    }
    if !(rel.reserve_margin_pct.is_finite() && rel.reserve_margin_pct >= 0.0) {
        return Err(InitializationError::InvalidReliabilityThreshold {
            field: "reserve_margin_pct",
            value: rel.reserve_margin_pct,
        });
    }
    Ok(())
}
