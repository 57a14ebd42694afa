//! Microgrid digital-twin stepping kernel.
//!
//! A [`SimulationStepper`](sim::stepper::SimulationStepper) advances a
//! battery, a dispatchable generator, and a grid tie one externally-timed
//! step at a time against tabulated solar, load, and price profiles.

pub mod config;
pub mod devices;
pub mod error;
pub mod profile;
pub mod sim;

#[cfg(feature = "api")]
pub mod api;

pub use config::MicrogridConfig;
pub use error::{InitializationError, InvalidStepError, SimulationFault, StepError};
pub use sim::stepper::{SimulationStepper, StepperState};
pub use sim::types::{StepInput, StepOutput};
