//! Discrete-element time stepping for polydisperse granular flows.
//!
//! The crate advances contact-interacting spherical particles under pairwise
//! contact forces, gravity and domain boundaries. It is organised leaves first:
//!
//! - [`hgrid`]: hierarchical grid broad phase for radii spanning several decades
//! - [`registry`]: generational particle storage that keeps the grid in sync
//! - [`interaction`]: persistent contact records keyed by canonical pairs
//! - [`boundary`]: periodic, sheared, angled, insertion and deletion boundaries
//! - [`wall`]: analytic surfaces exposing a distance/normal contract
//! - [`species`]: contact-law parameters and species mixing
//! - [`simulation`]: the step controller tying everything together
//! - [`output`]: checkpoint, trajectory, contact and energy sinks
//!
//! # Example
//!
//! ```
//! use dem::config::{Dimension, SimulationConfig};
//! use dem::particle::Particle;
//! use dem::simulation::Simulation;
//! use dem::species::Species;
//! use nalgebra::{Point3, Vector3};
//!
//! let config = SimulationConfig::default()
//!     .with_dimension(Dimension::Three)
//!     .with_time_step(1e-4)
//!     .with_max_time(1e-3)
//!     .with_gravity(Vector3::new(0.0, 0.0, -9.81));
//!
//! let mut sim = Simulation::new(config);
//! let sand = sim.add_species(Species::frictionless(2000.0, 1e5, 0.5));
//! sim.add_particle(Particle::new(sand, 0.01, Point3::new(0.5, 0.5, 0.5))).unwrap();
//!
//! let summary = sim.solve(&mut dem::output::Outputs::none()).unwrap();
//! assert_eq!(summary.steps, 10);
//! ```

pub mod boundary;
pub mod config;
pub mod error;
pub mod forces;
pub mod hgrid;
pub mod image;
pub mod integrator;
pub mod interaction;
pub mod logging;
pub mod output;
pub mod particle;
pub mod registry;
pub mod simulation;
pub mod species;
pub mod wall;

#[cfg(test)]
mod hgrid_test;
#[cfg(test)]
mod integrator_test;

pub use config::{Dimension, SimulationConfig};
pub use error::{ConfigError, DemError};
pub use particle::{Particle, ParticleId};
pub use simulation::Simulation;
pub use species::{Species, SpeciesId};
