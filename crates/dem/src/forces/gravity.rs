//! Uniform gravitational acceleration.

use nalgebra::Vector3;

use super::BodyForce;
use crate::particle::Particle;

/// Constant acceleration field, e.g. `(0, 0, -9.81)`.
///
/// # Examples
///
/// ```
/// use dem::forces::{BodyForce, UniformGravity};
/// use dem::particle::Particle;
/// use dem::species::SpeciesId;
/// use nalgebra::{Point3, Vector3};
///
/// let gravity = UniformGravity::new(Vector3::new(0.0, 0.0, -10.0));
/// let mut p = Particle::new(SpeciesId(0), 0.1, Point3::new(0.0, 0.0, 2.0));
/// p.mass = 3.0;
///
/// assert_eq!(gravity.force(&p), Vector3::new(0.0, 0.0, -30.0));
/// assert_eq!(gravity.potential_energy(&p), 60.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformGravity {
    pub acceleration: Vector3<f64>,
}

impl UniformGravity {
    pub fn new(acceleration: Vector3<f64>) -> Self {
        Self { acceleration }
    }
}

impl BodyForce for UniformGravity {
    fn force(&self, particle: &Particle) -> Vector3<f64> {
        self.acceleration * particle.mass
    }

    fn potential_energy(&self, particle: &Particle) -> f64 {
        -particle.mass * self.acceleration.dot(&particle.position.coords)
    }
}
