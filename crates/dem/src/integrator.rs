//! Time integration for particles
//!
//! Translational and rotational motion use velocity Verlet, split around the
//! force pass:
//!
//! 1. Before forces: v(t + dt/2) = v(t) + F(t)/m * dt/2, then x(t + dt) = x(t) + v(t + dt/2) * dt
//! 2. After forces: v(t + dt) = v(t + dt/2) + F(t + dt)/m * dt/2
//!
//! Angular velocity follows the same scheme with torque and moment of
//! inertia, and orientation advances by the rotation `exp(ω dt)`.
//!
//! Fixed particles and ghosts are never integrated.

use nalgebra::{UnitQuaternion, Vector3};

use crate::config::Dimension;
use crate::particle::Particle;

/// Velocity Verlet for translation and rotation.
///
/// # Examples
///
/// ```
/// use dem::config::Dimension;
/// use dem::integrator::VelocityVerlet;
/// use dem::particle::Particle;
/// use dem::species::SpeciesId;
/// use nalgebra::{Point3, Vector3};
///
/// let mut p = Particle::new(SpeciesId(0), 0.1, Point3::origin())
///     .with_velocity(Vector3::new(1.0, 0.0, 0.0));
/// p.set_mass_from_density(1000.0, Dimension::Three);
///
/// let verlet = VelocityVerlet::new(Dimension::Three);
/// verlet.integrate_before_force(&mut p, 0.5);
/// verlet.integrate_after_force(&mut p, 0.5);
/// assert_eq!(p.position.x, 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityVerlet {
    pub dimension: Dimension,
}

impl VelocityVerlet {
    pub fn new(dimension: Dimension) -> Self {
        Self { dimension }
    }

    fn integrates(particle: &Particle) -> bool {
        !particle.fixed && !particle.is_ghost()
    }

    /// Half kick with the current forces, then a full drift.
    pub fn integrate_before_force(&self, particle: &mut Particle, dt: f64) {
        if !Self::integrates(particle) {
            return;
        }
        let half = 0.5 * dt;

        particle.velocity += particle.force * (particle.inv_mass() * half);
        particle.angular_velocity += particle.torque * (particle.inv_inertia() * half);
        self.constrain(particle);

        particle.position += particle.velocity * dt;
        particle.orientation =
            UnitQuaternion::from_scaled_axis(particle.angular_velocity * dt) * particle.orientation;
    }

    /// Second half kick with the freshly computed forces.
    pub fn integrate_after_force(&self, particle: &mut Particle, dt: f64) {
        if !Self::integrates(particle) {
            return;
        }
        let half = 0.5 * dt;

        particle.velocity += particle.force * (particle.inv_mass() * half);
        particle.angular_velocity += particle.torque * (particle.inv_inertia() * half);
        self.constrain(particle);
    }

    /// Discs stay in the xy plane and spin only about z.
    fn constrain(&self, particle: &mut Particle) {
        if self.dimension == Dimension::Two {
            particle.velocity.z = 0.0;
            particle.angular_velocity = Vector3::new(0.0, 0.0, particle.angular_velocity.z);
        }
    }
}
