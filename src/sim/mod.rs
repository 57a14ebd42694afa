/// Fixed-cadence clock for lockstep runs.
pub mod clock;
pub mod constraints;
pub mod cost;
/// Transient exogenous disturbances.
pub mod disturbance;
/// Controller-in-the-loop driver and step records.
pub mod driver;
pub mod emissions;
pub mod power_balance;
pub mod reliability;
/// Run totals and health assessment.
pub mod report;
/// The stateful single-step kernel.
pub mod stepper;
pub mod types;
