//! Integration tests for single-step semantics of the stepper.

mod common;

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;

use microgrid_twin::config::MicrogridConfig;
use microgrid_twin::error::{InvalidStepError, SimulationFault, StepError};
use microgrid_twin::sim::stepper::{SimulationStepper, StepperState};
use microgrid_twin::sim::types::{StepInput, StepOutput};

use common::HOUR;

fn run_all(stepper: &mut SimulationStepper, inputs: &[StepInput]) -> Vec<StepOutput> {
    inputs.iter().map(|i| stepper.step(*i).unwrap()).collect()
}

#[test]
fn solar_interpolates_between_breakpoints() {
    let stepper = common::reference_stepper();
    // 9.5 h lies halfway between 500 W at 7 h and 4000 W at 12 h.
    assert_eq!(stepper.sample(34_200.0).solar_w, 2250.0);
}

#[test]
fn one_kilowatt_for_an_hour_adds_ten_percent() {
    let mut stepper = common::reference_stepper();
    let out = stepper
        .step(StepInput::new(0.0, HOUR, 1000.0, 0.0))
        .unwrap();
    assert_eq!(out.battery_soc, 60.0);
    assert_eq!(stepper.battery().energy_wh(), 6000.0);
}

#[test]
fn idle_midnight_imports_the_load() {
    let mut stepper = common::reference_stepper();
    let out = stepper.step(StepInput::new(0.0, 60.0, 0.0, 0.0)).unwrap();
    assert_eq!(out.load_power, 800.0);
    assert_eq!(out.solar_power, 0.0);
    assert_eq!(out.grid_power, 800.0);
    assert!(out.total_cost > 0.0);
}

#[test]
fn negative_generator_faults_without_committing() {
    let mut stepper = common::reference_stepper();
    let err = stepper
        .step(StepInput::new(0.0, HOUR, 1000.0, -1.0))
        .unwrap_err();
    assert!(matches!(
        err,
        StepError::Fault(SimulationFault::GeneratorAbsorbing { .. })
    ));
    assert!(matches!(stepper.state(), StepperState::Faulted(_)));
    assert_eq!(stepper.battery().energy_wh(), 5000.0);

    // Stays faulted until reset.
    let again = stepper.step(StepInput::new(HOUR, HOUR, 0.0, 0.0));
    assert!(matches!(again, Err(StepError::Faulted(_))));
}

#[test]
fn overcharge_faults() {
    let mut stepper = common::reference_stepper();
    let err = stepper
        .step(StepInput::new(0.0, HOUR, 5001.0, 0.0))
        .unwrap_err();
    assert!(matches!(
        err.fault(),
        Some(SimulationFault::BatteryLimitViolated { .. })
    ));
}

#[test]
fn invalid_calls_leave_state_alone() {
    let mut stepper = common::reference_stepper();
    stepper.step(StepInput::new(HOUR, HOUR, 500.0, 0.0)).unwrap();
    let energy = stepper.battery().energy_wh();

    let zero_dt = stepper.step(StepInput::new(2.0 * HOUR, 0.0, 0.0, 0.0));
    assert!(matches!(
        zero_dt,
        Err(StepError::Invalid(InvalidStepError::NonPositiveDt(_)))
    ));
    let backwards = stepper.step(StepInput::new(0.5 * HOUR, HOUR, 0.0, 0.0));
    assert!(matches!(
        backwards,
        Err(StepError::Invalid(InvalidStepError::NonIncreasingTime { .. }))
    ));

    assert_eq!(stepper.state(), StepperState::Stepping);
    assert_eq!(stepper.battery().energy_wh(), energy);
    assert_eq!(stepper.last_time_s(), Some(HOUR));
}

#[test]
fn reset_matches_a_fresh_instance() {
    let inputs = common::hourly_inputs(24);

    let mut reused = common::reference_stepper();
    run_all(&mut reused, &inputs[..10]);
    reused.stop();
    reused.reset();
    // A second reset changes nothing.
    reused.reset();
    assert_eq!(reused.state(), StepperState::Ready);

    let mut fresh = common::reference_stepper();
    assert_eq!(run_all(&mut reused, &inputs), run_all(&mut fresh, &inputs));
}

#[test]
fn identical_runs_are_bit_identical() {
    let inputs = common::hourly_inputs(48);
    let a = run_all(&mut common::reference_stepper(), &inputs);
    let b = run_all(&mut common::reference_stepper(), &inputs);
    assert_eq!(a, b);
}

#[test]
fn shared_signals_across_threads() {
    let signals = common::shared_signals();
    let inputs = Arc::new(common::hourly_inputs(24));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let signals = Arc::clone(&signals);
            let inputs = Arc::clone(&inputs);
            thread::spawn(move || {
                let mut stepper =
                    SimulationStepper::new(MicrogridConfig::reference(), signals).unwrap();
                run_all(&mut stepper, &inputs)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for r in &results[1..] {
        assert_eq!(r, &results[0]);
    }
}

#[test]
fn initial_energy_above_capacity_is_rejected() {
    let mut config = MicrogridConfig::reference();
    config.battery.initial_energy_wh = 12_000.0;
    assert!(SimulationStepper::from_config(config).is_err());
}

proptest! {
    #[test]
    fn battery_stays_within_bounds(
        steps in prop::collection::vec((-6000.0f64..6000.0, 1.0f64..3600.0), 1..60),
    ) {
        let mut stepper = common::reference_stepper();
        let capacity = stepper.battery().capacity_wh();
        let mut time_s = 0.0;

        for (setpoint, dt) in steps {
            let before = stepper.battery().energy_wh();
            match stepper.step(StepInput::new(time_s, dt, setpoint, 0.0)) {
                Ok(out) => {
                    prop_assert!((0.0..=100.0).contains(&out.battery_soc));
                    let energy = stepper.battery().energy_wh();
                    prop_assert!((0.0..=capacity).contains(&energy));
                }
                Err(e) => {
                    prop_assert!(
                        matches!(e.fault(), Some(SimulationFault::BatteryLimitViolated { .. })),
                        "unexpected error: {e}"
                    );
                    prop_assert_eq!(stepper.battery().energy_wh(), before);
                    break;
                }
            }
            time_s += dt;
        }
    }

    #[test]
    fn negative_generator_always_absorbs(
        generator in -1.0e6f64..-1.0e-9,
        battery in -1.0e6f64..1.0e6,
        dt in 1.0f64..86_400.0,
        time_s in 0.0f64..172_800.0,
    ) {
        let mut stepper = common::reference_stepper();
        let err = stepper
            .step(StepInput::new(time_s, dt, battery, generator))
            .unwrap_err();
        prop_assert!(
            matches!(err, StepError::Fault(SimulationFault::GeneratorAbsorbing { .. })),
            "unexpected error: {err}"
        );
        prop_assert_eq!(stepper.battery().energy_wh(), 5000.0);
    }
}
