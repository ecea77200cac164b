//! Analytic walls.
//!
//! A wall only has to answer one question: how far is a particle from it and
//! in which direction. The force pass turns that into an overlap and feeds it
//! to the mixed contact law, exactly as for particle pairs.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::species::SpeciesId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WallId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WallShape {
    /// Half-space `n·x < offset` is solid; `normal` points into the domain.
    Plane { normal: Vector3<f64>, offset: f64 },
    /// Particles live inside the cylinder.
    Cylinder {
        origin: Point3<f64>,
        axis: Vector3<f64>,
        radius: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub shape: WallShape,
    pub species: SpeciesId,
    /// Rigid translation velocity, used for the contact relative velocity
    /// and by [`Wall::advance`].
    pub velocity: Vector3<f64>,
}

impl Wall {
    /// Plane through `point` with `normal` facing the particles.
    ///
    /// # Examples
    ///
    /// ```
    /// use dem::species::SpeciesId;
    /// use dem::wall::Wall;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let floor = Wall::plane(Vector3::z(), Point3::origin(), SpeciesId(0));
    /// let (distance, normal) = floor
    ///     .distance_and_normal(&Point3::new(3.0, 1.0, 0.25), 0.5)
    ///     .unwrap();
    /// assert_eq!(distance, 0.25);
    /// assert_eq!(normal, -Vector3::z());
    /// ```
    pub fn plane(normal: Vector3<f64>, point: Point3<f64>, species: SpeciesId) -> Self {
        let normal = normal.normalize();
        Wall {
            shape: WallShape::Plane {
                normal,
                offset: normal.dot(&point.coords),
            },
            species,
            velocity: Vector3::zeros(),
        }
    }

    pub fn cylinder(
        origin: Point3<f64>,
        axis: Vector3<f64>,
        radius: f64,
        species: SpeciesId,
    ) -> Self {
        Wall {
            shape: WallShape::Cylinder {
                origin,
                axis: axis.normalize(),
                radius,
            },
            species,
            velocity: Vector3::zeros(),
        }
    }

    pub fn with_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.velocity = velocity;
        self
    }

    /// Distance from the particle centre to the wall surface and the unit
    /// normal pointing from the particle towards the wall, or `None` when a
    /// particle of this radius cannot be touching.
    pub fn distance_and_normal(
        &self,
        position: &Point3<f64>,
        radius: f64,
    ) -> Option<(f64, Vector3<f64>)> {
        let (distance, normal) = match &self.shape {
            WallShape::Plane { normal, offset } => (normal.dot(&position.coords) - offset, -normal),
            WallShape::Cylinder {
                origin,
                axis,
                radius: wall_radius,
            } => {
                let r = position - origin;
                let radial = r - axis * r.dot(axis);
                let rho = radial.norm();
                let outward = if rho > 0.0 {
                    radial / rho
                } else {
                    // on the axis every direction is equally close
                    let helper = if axis.x.abs() < 0.9 {
                        Vector3::x()
                    } else {
                        Vector3::y()
                    };
                    axis.cross(&helper).normalize()
                };
                (wall_radius - rho, outward)
            }
        };
        if distance < radius {
            Some((distance, normal))
        } else {
            None
        }
    }

    /// Moves the wall rigidly by `velocity * dt`.
    pub fn advance(&mut self, dt: f64) {
        let shift = self.velocity * dt;
        match &mut self.shape {
            WallShape::Plane { normal, offset } => *offset += normal.dot(&shift),
            WallShape::Cylinder { origin, .. } => *origin += shift,
        }
    }
}
