//! Lees-Edwards sheared periodic boundary.
//!
//! The box is periodic along x. Along y it is periodic too, but the image
//! above is shifted in x by an offset that grows with time and moves at the
//! shear velocity, so a particle leaving through the top re-enters at the
//! bottom displaced in x and slowed by the shear velocity. Images use two
//! axes: `axis` counts x periods and `axis + 1` counts y periods.
//!
//! Image labels refer to the unwrapped shear: the image `(n, m)` sits at
//! `n * width + m * shift(t)` along x, where `shift` keeps growing. The
//! wrapped [`LeesEdwardsBoundary::offset`] places ghosts near the box, and
//! the whole periods it drops are counted on the x axis, so a label never
//! changes when the offset wraps.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use super::{apply_fold, spawn_ghost, FoldOutcome, Side};
use crate::error::ConfigError;
use crate::image::{ImageOffset, ImageTransform};
use crate::particle::Particle;
use crate::registry::ParticleRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeesEdwardsBoundary {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    shear_velocity: f64,
    initial_offset: f64,
    pub(crate) axis: usize,
}

impl LeesEdwardsBoundary {
    /// Box `[min.x, max.x) x [min.y, max.y)`; the image above moves with
    /// `+shear_velocity` along x.
    pub fn new(min: Point3<f64>, max: Point3<f64>, shear_velocity: f64) -> Self {
        Self {
            x_min: min.x,
            x_max: max.x,
            y_min: min.y,
            y_max: max.y,
            shear_velocity,
            initial_offset: 0.0,
            axis: 0,
        }
    }

    pub fn with_initial_offset(mut self, offset: f64) -> Self {
        self.initial_offset = offset;
        self
    }

    pub fn shear_velocity(&self) -> f64 {
        self.shear_velocity
    }

    fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// x shift of the image above at `time`, in `[0, width)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dem::boundary::LeesEdwardsBoundary;
    /// use nalgebra::Point3;
    ///
    /// let b = LeesEdwardsBoundary::new(Point3::origin(), Point3::new(4.0, 2.0, 1.0), 1.0);
    /// assert_eq!(b.offset(1.5), 1.5);
    /// assert_eq!(b.offset(5.0), 1.0);
    /// ```
    pub fn offset(&self, time: f64) -> f64 {
        self.shift(time) - f64::from(self.wraps(time)) * self.width()
    }

    fn shift(&self, time: f64) -> f64 {
        self.initial_offset + self.shear_velocity * time
    }

    /// Whole x periods contained in the unwrapped shift at `time`.
    fn wraps(&self, time: f64) -> i32 {
        (self.shift(time) / self.width()).floor() as i32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad = |reason: String| ConfigError::InvalidBoundary {
            boundary: "Lees-Edwards",
            reason,
        };
        if !(self.width() > 0.0 && self.width().is_finite()) {
            return Err(bad(format!("x range [{}, {}) is empty", self.x_min, self.x_max)));
        }
        if !(self.height() > 0.0 && self.height().is_finite()) {
            return Err(bad(format!("y range [{}, {}) is empty", self.y_min, self.y_max)));
        }
        if !self.shear_velocity.is_finite() {
            return Err(bad("shear velocity must be finite".to_string()));
        }
        Ok(())
    }

    /// Distance to the nearest of the four faces; ties go to the lower face.
    pub fn distance_to(&self, position: &Point3<f64>, _time: f64) -> (f64, Side) {
        let (dy, side_y) = Self::nearest(position.y, self.y_min, self.y_max);
        let (dx, side_x) = Self::nearest(position.x, self.x_min, self.x_max);
        if dy <= dx {
            (dy, side_y)
        } else {
            (dx, side_x)
        }
    }

    fn nearest(s: f64, low: f64, high: f64) -> (f64, Side) {
        if s - low <= high - s {
            (s - low, Side::Left)
        } else {
            (high - s, Side::Right)
        }
    }

    /// Transform to the image `steps` periods up in y, with its label.
    fn vertical(&self, steps: i32, time: f64) -> (ImageOffset, ImageTransform) {
        let image = ImageOffset::along(self.axis + 1, steps)
            + ImageOffset::along(self.axis, -steps * self.wraps(time));
        let s = f64::from(steps);
        let transform = ImageTransform::sheared(
            Vector3::new(s * self.offset(time), s * self.height(), 0.0),
            Vector3::new(s * self.shear_velocity, 0.0, 0.0),
        );
        (image, transform)
    }

    fn horizontal(&self, steps: f64) -> ImageTransform {
        ImageTransform::translation(Vector3::new(steps * self.width(), 0.0, 0.0))
    }

    /// Maps to the neighbouring images above and to the right at `time`.
    pub(crate) fn image_generators(&self, time: f64) -> Vec<ImageTransform> {
        vec![self.vertical(1, time).1, self.horizontal(1.0)]
    }

    /// Sheared ghosts across y first, then plain ghosts across x for every
    /// particle including the new y ghosts.
    pub fn create_ghosts(&self, particles: &mut ParticleRegistry, time: f64) -> usize {
        let reach = particles.max_interaction_radius();
        let mut created = 0;

        for id in particles.ids() {
            let Some(p) = particles.get(id) else { continue };
            let (distance, side) = Self::nearest(p.position.y, self.y_min, self.y_max);
            if distance >= p.interaction_radius + reach {
                continue;
            }
            let steps = if side == Side::Left { 1 } else { -1 };
            let (image, transform) = self.vertical(steps, time);
            if spawn_ghost(particles, id, image, &transform).is_some() {
                created += 1;
            }
        }

        for id in particles.ids() {
            let Some(p) = particles.get(id) else { continue };
            let (distance, side) = Self::nearest(p.position.x, self.x_min, self.x_max);
            if distance >= p.interaction_radius + reach {
                continue;
            }
            let steps = if side == Side::Left { 1 } else { -1 };
            let transform = self.horizontal(steps as f64);
            if spawn_ghost(particles, id, ImageOffset::along(self.axis, steps), &transform)
                .is_some()
            {
                created += 1;
            }
        }
        created
    }

    /// Wraps y first (with shear shift and velocity jump), then x.
    pub fn fold(&self, particle: &mut Particle, time: f64) -> FoldOutcome {
        let mut image = ImageOffset::ZERO;

        let y_steps = if particle.position.y < self.y_min {
            1
        } else if particle.position.y >= self.y_max {
            -1
        } else {
            0
        };
        if y_steps != 0 {
            let (shifted, transform) = self.vertical(y_steps, time);
            apply_fold(particle, &transform);
            image += shifted;
        }

        let x_steps = if particle.position.x < self.x_min {
            1
        } else if particle.position.x >= self.x_max {
            -1
        } else {
            0
        };
        if x_steps != 0 {
            apply_fold(particle, &self.horizontal(x_steps as f64));
            image += ImageOffset::along(self.axis, x_steps);
        }

        if image.is_zero() {
            FoldOutcome::Inside
        } else {
            FoldOutcome::Folded {
                image,
                rotation: UnitQuaternion::identity(),
            }
        }
    }
}
