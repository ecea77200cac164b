//! Deletion boundary: particles past a plane leave the simulation.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::FoldOutcome;
use crate::error::ConfigError;
use crate::particle::Particle;

/// Removes every particle whose centre lies beyond the plane, i.e. on the
/// side its normal points to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionBoundary {
    normal: Vector3<f64>,
    offset: f64,
    deleted: u64,
}

impl DeletionBoundary {
    pub fn new(normal: Vector3<f64>, point: Point3<f64>) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            offset: normal.dot(&point.coords),
            deleted: 0,
        }
    }

    /// Particles removed so far.
    pub fn deleted(&self) -> u64 {
        self.deleted
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.normal.iter().all(|c| c.is_finite()) && self.offset.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::InvalidBoundary {
                boundary: "deletion",
                reason: "plane normal must be a finite non-zero vector".to_string(),
            })
        }
    }

    pub fn fold(&mut self, particle: &mut Particle) -> FoldOutcome {
        if self.normal.dot(&particle.position.coords) > self.offset {
            self.deleted += 1;
            FoldOutcome::Remove
        } else {
            FoldOutcome::Inside
        }
    }
}
