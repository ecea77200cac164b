//! Particles and their identity.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::config::Dimension;
use crate::image::{ImageOffset, ImageTransform};
use crate::species::SpeciesId;

new_key_type! {
    /// Generation-checked particle handle.
    ///
    /// A removed particle's id never aliases a later insertion, so stale ids
    /// held by interactions or callers simply fail to resolve.
    pub struct ParticleId;
}

/// Whether a particle is integrated or is a periodic copy of another one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Role {
    Real,
    /// Ghosts exist only between ghost creation and ghost removal within one
    /// step. `master` is always a real particle, even for ghosts of ghosts.
    Ghost {
        master: ParticleId,
        image: ImageOffset,
        transform: ImageTransform,
    },
}

/// A spherical particle (a disc in 2D).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: Point3<f64>,
    pub velocity: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub angular_velocity: Vector3<f64>,
    /// Accumulated force, rebuilt every force pass.
    pub force: Vector3<f64>,
    pub torque: Vector3<f64>,
    pub radius: f64,
    /// Radius used by the broad phase and ghost ranges; at least `radius`.
    pub interaction_radius: f64,
    pub species: SpeciesId,
    /// Fixed particles keep their state and only take part as obstacles.
    pub fixed: bool,
    pub mass: f64,
    pub inertia: f64,
    pub role: Role,
}

impl Particle {
    /// Creates a real particle at rest.
    ///
    /// Mass and inertia are zero until [`Particle::set_mass_from_density`] is
    /// called; the simulation does that when the particle is added.
    ///
    /// # Examples
    ///
    /// ```
    /// use dem::particle::Particle;
    /// use dem::species::SpeciesId;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let p = Particle::new(SpeciesId(0), 0.5, Point3::new(1.0, 2.0, 3.0))
    ///     .with_velocity(Vector3::new(0.0, 0.0, -1.0));
    /// assert_eq!(p.interaction_radius, 0.5);
    /// assert!(!p.is_ghost());
    /// ```
    pub fn new(species: SpeciesId, radius: f64, position: Point3<f64>) -> Self {
        Particle {
            position,
            velocity: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
            radius,
            interaction_radius: radius,
            species,
            fixed: false,
            mass: 0.0,
            inertia: 0.0,
            role: Role::Real,
        }
    }

    pub fn with_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vector3<f64>) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_interaction_radius(mut self, interaction_radius: f64) -> Self {
        self.interaction_radius = interaction_radius.max(self.radius);
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Sets mass and moment of inertia from material density.
    pub fn set_mass_from_density(&mut self, density: f64, dimension: Dimension) {
        self.mass = density * dimension.volume(self.radius);
        self.inertia = dimension.inertia_factor() * self.mass * self.radius * self.radius;
    }

    /// Inverse mass, zero for fixed or massless particles.
    pub fn inv_mass(&self) -> f64 {
        if self.fixed || self.mass <= 0.0 {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    pub fn inv_inertia(&self) -> f64 {
        if self.fixed || self.inertia <= 0.0 {
            0.0
        } else {
            1.0 / self.inertia
        }
    }

    pub fn is_ghost(&self) -> bool {
        matches!(self.role, Role::Ghost { .. })
    }

    /// Resolves a particle to its real master, its image and the transform
    /// that produced it. Real particles are their own master at image zero.
    pub fn origin(&self, id: ParticleId) -> (ParticleId, ImageOffset, ImageTransform) {
        match self.role {
            Role::Real => (id, ImageOffset::ZERO, ImageTransform::identity()),
            Role::Ghost {
                master,
                image,
                transform,
            } => (master, image, transform),
        }
    }

    pub fn momentum(&self) -> Vector3<f64> {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.magnitude_squared()
    }

    pub fn rotational_energy(&self) -> f64 {
        0.5 * self.inertia * self.angular_velocity.magnitude_squared()
    }

    pub fn distance_to(&self, other: &Particle) -> f64 {
        (self.position - other.position).magnitude()
    }
}
