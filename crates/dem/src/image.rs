//! Periodic images.
//!
//! Every periodic-type boundary owns one or two *image axes*. An
//! [`ImageOffset`] counts how many times a copy has been shifted along each
//! axis, and an [`ImageTransform`] is the rigid map (rotation, translation
//! and velocity shift) that produces the copy from the real particle.
//!
//! Offsets add component-wise, which lets interactions be keyed by the
//! *relative* image between two masters instead of by short-lived ghost ids.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Number of independent image axes a run may use.
pub const MAX_IMAGE_AXES: usize = 4;

/// Integer lattice coordinates of a periodic image.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ImageOffset(pub [i32; MAX_IMAGE_AXES]);

impl ImageOffset {
    pub const ZERO: ImageOffset = ImageOffset([0; MAX_IMAGE_AXES]);

    /// A single step count along one axis.
    ///
    /// # Examples
    ///
    /// ```
    /// use dem::image::ImageOffset;
    ///
    /// let right = ImageOffset::along(0, 1);
    /// let up = ImageOffset::along(1, -1);
    /// assert_eq!((right + up).steps(1), -1);
    /// assert!((right - right).is_zero());
    /// ```
    pub fn along(axis: usize, steps: i32) -> Self {
        let mut counts = [0; MAX_IMAGE_AXES];
        if let Some(slot) = counts.get_mut(axis) {
            *slot = steps;
        }
        ImageOffset(counts)
    }

    pub fn steps(&self, axis: usize) -> i32 {
        self.0.get(axis).copied().unwrap_or(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }
}

impl Add for ImageOffset {
    type Output = ImageOffset;

    fn add(self, rhs: ImageOffset) -> ImageOffset {
        let mut counts = self.0;
        counts
            .iter_mut()
            .zip(rhs.0)
            .for_each(|(c, r)| *c = c.saturating_add(r));
        ImageOffset(counts)
    }
}

impl Sub for ImageOffset {
    type Output = ImageOffset;

    fn sub(self, rhs: ImageOffset) -> ImageOffset {
        self + (-rhs)
    }
}

impl Neg for ImageOffset {
    type Output = ImageOffset;

    fn neg(self) -> ImageOffset {
        ImageOffset(self.0.map(|c| c.saturating_neg()))
    }
}

impl AddAssign for ImageOffset {
    fn add_assign(&mut self, rhs: ImageOffset) {
        *self = *self + rhs;
    }
}

impl SubAssign for ImageOffset {
    fn sub_assign(&mut self, rhs: ImageOffset) {
        *self = *self - rhs;
    }
}

/// Rigid map from a real particle to one of its images.
///
/// Positions map as `x' = R x + t`, velocities as `v' = R v + dv`, and
/// orientation-like quantities (angular velocity, forces, torques) as
/// `w' = R w`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageTransform {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
    pub velocity_offset: Vector3<f64>,
}

impl ImageTransform {
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
            velocity_offset: Vector3::zeros(),
        }
    }

    pub fn translation(shift: Vector3<f64>) -> Self {
        Self {
            translation: shift,
            ..Self::identity()
        }
    }

    /// Translation that also carries a velocity jump (sheared images).
    pub fn sheared(shift: Vector3<f64>, velocity_offset: Vector3<f64>) -> Self {
        Self {
            translation: shift,
            velocity_offset,
            ..Self::identity()
        }
    }

    /// Rotation about an axis through `origin`.
    pub fn rotation_about(origin: &Point3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self {
            rotation,
            translation: origin.coords - rotation * origin.coords,
            velocity_offset: Vector3::zeros(),
        }
    }

    pub fn apply_point(&self, p: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * p.coords + self.translation)
    }

    pub fn apply_velocity(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * v + self.velocity_offset
    }

    pub fn apply_vector(&self, w: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * w
    }

    /// Maps a vector expressed in the image frame back to the real frame.
    pub fn unapply_vector(&self, w: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse_transform_vector(w)
    }

    pub fn unapply_point(&self, p: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse_transform_vector(&(p.coords - self.translation)))
    }

    /// The transform equivalent to applying `self` and then `next`.
    pub fn then(&self, next: &ImageTransform) -> ImageTransform {
        ImageTransform {
            rotation: next.rotation * self.rotation,
            translation: next.rotation * self.translation + next.translation,
            velocity_offset: next.rotation * self.velocity_offset + next.velocity_offset,
        }
    }
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self::identity()
    }
}
