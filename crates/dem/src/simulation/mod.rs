//! Simulation state and the step controller.
//!
//! [`Simulation`] owns every piece of run state. [`Simulation::step`]
//! advances it by one time step in a fixed order, and
//! [`Simulation::solve`] runs the time loop with output and stopping rules.

mod driver;
mod state;

#[cfg(test)]
mod state_test;

pub use driver::{RunSummary, SolveOptions, StepStats, StopReason};
pub use state::{Energies, Simulation};
