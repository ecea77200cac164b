//! Run configuration.
//!
//! [`SimulationConfig`] collects everything the step controller needs that is
//! not part of the particle/boundary/wall description: time stepping, output
//! cadence, gravity, domain extents and broad-phase tuning. Values are set
//! through `with_*` builders and checked once by [`SimulationConfig::validate`].

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::ConfigError;
use crate::hgrid::HGridSettings;

/// Spatial dimension of the system.
///
/// Two-dimensional systems are discs confined to the xy plane: `z`
/// components of velocities and forces and the in-plane components of
/// angular velocity are held at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Two,
    Three,
}

impl Dimension {
    /// Number of spatial axes used for cell indexing.
    pub fn axes(&self) -> usize {
        match self {
            Dimension::Two => 2,
            Dimension::Three => 3,
        }
    }

    /// Volume (area in 2D) of a particle of the given radius.
    pub fn volume(&self, radius: f64) -> f64 {
        match self {
            Dimension::Two => PI * radius * radius,
            Dimension::Three => 4.0 / 3.0 * PI * radius.powi(3),
        }
    }

    /// Moment of inertia prefactor: `I = factor * m * r^2`.
    pub fn inertia_factor(&self) -> f64 {
        match self {
            Dimension::Two => 0.5,
            Dimension::Three => 0.4,
        }
    }
}

/// Configuration for a simulation run.
///
/// # Examples
///
/// ```
/// use dem::config::{Dimension, SimulationConfig};
///
/// let config = SimulationConfig::default()
///     .with_dimension(Dimension::Three)
///     .with_time_step(1e-5)
///     .with_save_every(500);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Run name, used as the stem for output files.
    pub name: String,
    pub dimension: Option<Dimension>,
    pub time_step: f64,
    pub max_time: f64,
    /// Outputs are written every `save_every` steps.
    pub save_every: u64,
    pub gravity: Vector3<f64>,
    /// Nominal domain extents. Boundaries and walls define the physics; these
    /// are used by front ends to place them.
    pub domain_min: Point3<f64>,
    pub domain_max: Point3<f64>,
    pub hgrid: HGridSettings,
}

impl SimulationConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dimension: None,
            time_step: 1e-4,
            max_time: 1.0,
            save_every: 100,
            gravity: Vector3::zeros(),
            domain_min: Point3::origin(),
            domain_max: Point3::new(1.0, 1.0, 1.0),
            hgrid: HGridSettings::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimension = Some(dimension);
        self
    }

    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_max_time(mut self, max_time: f64) -> Self {
        self.max_time = max_time;
        self
    }

    pub fn with_save_every(mut self, save_every: u64) -> Self {
        self.save_every = save_every;
        self
    }

    pub fn with_gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_domain(mut self, min: Point3<f64>, max: Point3<f64>) -> Self {
        self.domain_min = min;
        self.domain_max = max;
        self
    }

    pub fn with_hgrid(mut self, hgrid: HGridSettings) -> Self {
        self.hgrid = hgrid;
        self
    }

    /// Checks the run parameters and returns the resolved dimension.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found: a non-positive or non-finite
    /// time step or end time, a zero save cadence, an unset dimension or
    /// unusable grid settings.
    pub fn validate(&self) -> Result<Dimension, ConfigError> {
        if !(self.time_step > 0.0 && self.time_step.is_finite()) {
            return Err(ConfigError::NonPositiveTimeStep(self.time_step));
        }
        if !(self.max_time > 0.0 && self.max_time.is_finite()) {
            return Err(ConfigError::NonPositiveMaxTime(self.max_time));
        }
        if self.save_every == 0 {
            return Err(ConfigError::ZeroSaveCadence);
        }
        self.hgrid.validate()?;
        self.dimension.ok_or(ConfigError::DimensionUnset)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new("dem")
    }
}
