//! Angled periodic boundary: a wedge repeated by rotation about an axis.
//!
//! The wedge spans polar angles `[0, angle)` measured from `start` around
//! `axis`. A particle leaving through one face re-enters through the other,
//! rotated by the wedge angle, with its velocity, spin and orientation
//! rotated alike. A wedge whose angle divides a full turn is how circular
//! periodicity is expressed.

use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::{apply_fold, spawn_ghost, FoldOutcome, Side};
use crate::error::ConfigError;
use crate::image::{ImageOffset, ImageTransform};
use crate::particle::Particle;
use crate::registry::ParticleRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngledPeriodicBoundary {
    origin: Point3<f64>,
    axis_direction: Vector3<f64>,
    start: Vector3<f64>,
    angle: f64,
    pub(crate) axis: usize,
}

impl AngledPeriodicBoundary {
    /// Wedge of `angle` radians about the line through `origin` along
    /// `axis_direction`, starting at the half-plane containing `start`.
    pub fn new(
        origin: Point3<f64>,
        axis_direction: Vector3<f64>,
        start: Vector3<f64>,
        angle: f64,
    ) -> Self {
        let axis_direction = axis_direction.normalize();
        let start = (start - axis_direction * start.dot(&axis_direction)).normalize();
        Self {
            origin,
            axis_direction,
            start,
            angle,
            axis: 0,
        }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad = |reason: String| ConfigError::InvalidBoundary {
            boundary: "angled periodic",
            reason,
        };
        if !(self.angle > 0.0 && self.angle <= PI) {
            return Err(bad(format!("wedge angle {} must lie in (0, pi]", self.angle)));
        }
        if !self.start.iter().chain(self.axis_direction.iter()).all(|c| c.is_finite()) {
            return Err(bad("axis and start direction must be non-zero and not parallel".to_string()));
        }
        Ok(())
    }

    fn rotation(&self, turns: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Unit::new_unchecked(self.axis_direction), turns * self.angle)
    }

    fn transform(&self, turns: f64) -> ImageTransform {
        ImageTransform::rotation_about(&self.origin, self.rotation(turns))
    }

    /// Distance from `r` (relative to the origin) to the half-plane spanned
    /// by the axis and `direction`.
    fn face_distance(&self, r: &Vector3<f64>, direction: &Vector3<f64>, inward: &Vector3<f64>) -> f64 {
        if r.dot(direction) >= 0.0 {
            r.dot(inward)
        } else {
            (r - self.axis_direction * r.dot(&self.axis_direction)).norm()
        }
    }

    /// Polar angle of a point around the axis, in `(-pi, pi]`.
    pub fn polar_angle(&self, position: &Point3<f64>) -> f64 {
        let r = position - self.origin;
        let across = self.axis_direction.cross(&self.start);
        r.dot(&across).atan2(r.dot(&self.start))
    }

    /// Distance to the nearer face; the start face is `Left` and wins ties.
    pub fn distance_to(&self, position: &Point3<f64>) -> (f64, Side) {
        let r = position - self.origin;
        let end = self.rotation(1.0) * self.start;
        let to_start = self.face_distance(&r, &self.start, &self.axis_direction.cross(&self.start));
        let to_end = self.face_distance(&r, &end, &end.cross(&self.axis_direction));
        if to_start <= to_end {
            (to_start, Side::Left)
        } else {
            (to_end, Side::Right)
        }
    }

    pub fn create_ghosts(&self, particles: &mut ParticleRegistry) -> usize {
        let reach = particles.max_interaction_radius();
        let forward = self.transform(1.0);
        let backward = self.transform(-1.0);

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

    pub(crate) fn image_generators(&self) -> Vec<ImageTransform> {
        vec![self.transform(1.0)]
    }

    /// Rotates a particle that left the wedge back inside.
    pub fn fold(&self, particle: &mut Particle) -> FoldOutcome {
        let phi = self.polar_angle(&particle.position);
        let turns = if phi < 0.0 {
            1.0
        } else if phi >= self.angle {
            -1.0
        } else {
            return FoldOutcome::Inside;
        };
        let transform = self.transform(turns);
        apply_fold(particle, &transform);
        FoldOutcome::Folded {
            image: ImageOffset::along(self.axis, turns as i32),
            rotation: transform.rotation,
        }
    }
}
