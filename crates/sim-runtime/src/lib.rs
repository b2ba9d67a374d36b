#![deny(warnings)]

//! Simulation runtime: the population engine and the driver folding it over
//! the horizon into a [`SimulationRecord`].

pub mod driver;
pub mod engine;
pub mod record;

pub use driver::{run, run_observed};
pub use engine::{PopulationEngine, StepOutcome};
pub use record::{ObservedRow, RunSummary, SegmentRow, SimulationRecord};
