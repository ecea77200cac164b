//! Translational periodic boundary between two parallel planes.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::{apply_fold, spawn_ghost, FoldOutcome, Side};
use crate::error::ConfigError;
use crate::image::{ImageOffset, ImageTransform};
use crate::particle::Particle;
use crate::registry::ParticleRegistry;

/// The slab `left <= n·x < right` repeated along `n`.
///
/// # Examples
///
/// ```
/// use dem::boundary::{PeriodicBoundary, Side};
/// use nalgebra::{Point3, Vector3};
///
/// let b = PeriodicBoundary::new(Vector3::x(), 0.0, 10.0);
/// assert_eq!(b.distance_to(&Point3::new(1.0, 0.0, 0.0)), (1.0, Side::Left));
/// assert_eq!(b.distance_to(&Point3::new(9.5, 0.0, 0.0)), (0.5, Side::Right));
/// assert_eq!(b.distance_to(&Point3::new(5.0, 0.0, 0.0)), (5.0, Side::Left));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodicBoundary {
    normal: Vector3<f64>,
    left: f64,
    right: f64,
    pub(crate) axis: usize,
}

impl PeriodicBoundary {
    /// `left` and `right` are plane positions measured along the normal.
    pub fn new(normal: Vector3<f64>, left: f64, right: f64) -> Self {
        Self {
            normal: normal.normalize(),
            left,
            right,
            axis: 0,
        }
    }

    /// Periodic along a coordinate axis between two points.
    pub fn between(normal: Vector3<f64>, left: &Point3<f64>, right: &Point3<f64>) -> Self {
        let normal = normal.normalize();
        Self::new(normal, normal.dot(&left.coords), normal.dot(&right.coords))
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    pub fn planes(&self) -> (f64, f64) {
        (self.left, self.right)
    }

    /// Moves both planes, e.g. for a periodic box that changes size.
    pub fn move_planes(&mut self, left: f64, right: f64) {
        self.left = left;
        self.right = right;
    }

    pub fn period(&self) -> f64 {
        self.right - self.left
    }

    fn shift(&self) -> Vector3<f64> {
        self.normal * self.period()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.normal.norm() > 0.0 && self.normal.iter().all(|c| c.is_finite())) {
            return Err(ConfigError::InvalidBoundary {
                boundary: "periodic",
                reason: "normal must be a finite non-zero vector".to_string(),
            });
        }
        if !(self.period() > 0.0 && self.period().is_finite()) {
            return Err(ConfigError::InvalidBoundary {
                boundary: "periodic",
                reason: format!(
                    "right plane {} must lie beyond left plane {}",
                    self.right, self.left
                ),
            });
        }
        Ok(())
    }

    /// Distance to the nearer plane. Ties go to the left plane.
    pub fn distance_to(&self, position: &Point3<f64>) -> (f64, Side) {
        let s = self.normal.dot(&position.coords);
        let to_left = s - self.left;
        let to_right = self.right - s;
        if to_left <= to_right {
            (to_left, Side::Left)
        } else {
            (to_right, Side::Right)
        }
    }

    /// Gives every particle within its own interaction radius plus the
    /// largest interaction radius of a plane one ghost on the far side.
    pub fn create_ghosts(&self, particles: &mut ParticleRegistry) -> usize {
        let reach = particles.max_interaction_radius();
        let forward = ImageTransform::translation(self.shift());
        let backward = ImageTransform::translation(-self.shift());

        let mut created = 0;
        for id in particles.ids() {
            let Some(p) = particles.get(id) else { continue };
            let (distance, side) = self.distance_to(&p.position);
            if distance >= p.interaction_radius + reach {
                continue;
            }
            let (step, transform) = match side {
                Side::Left => (ImageOffset::along(self.axis, 1), &forward),
                Side::Right => (ImageOffset::along(self.axis, -1), &backward),
            };
            if spawn_ghost(particles, id, step, transform).is_some() {
                created += 1;
            }
        }
        created
    }

    /// Map to the image one period beyond the right plane.
    pub(crate) fn image_generators(&self) -> Vec<ImageTransform> {
        vec![ImageTransform::translation(self.shift())]
    }

    /// Wraps a particle into `[left, right)`.
    pub fn fold(&self, particle: &mut Particle) -> FoldOutcome {
        let s = self.normal.dot(&particle.position.coords);
        let (steps, shift) = if s < self.left {
            (1, self.shift())
        } else if s >= self.right {
            (-1, -self.shift())
        } else {
            return FoldOutcome::Inside;
        };
        apply_fold(particle, &ImageTransform::translation(shift));
        FoldOutcome::Folded {
            image: ImageOffset::along(self.axis, steps),
            rotation: nalgebra::UnitQuaternion::identity(),
        }
    }
}
