//! Domain boundaries.
//!
//! Boundaries act on the particle set as a whole at fixed points of a step:
//!
//! - insertion boundaries add particles before integration,
//! - periodic-type boundaries create ghosts before the force pass and fold
//!   escaped particles back afterwards,
//! - deletion boundaries remove particles that crossed them.
//!
//! The set of boundary kinds is closed, so [`Boundary`] is an enum rather
//! than a trait object; that also lets the registry serialize it directly.

use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

use crate::config::Dimension;
use crate::error::ConfigError;
use crate::image::{ImageOffset, ImageTransform, MAX_IMAGE_AXES};
use crate::interaction::Fold;
use crate::particle::{Particle, ParticleId, Role};
use crate::registry::ParticleRegistry;
use crate::species::SpeciesTable;
use crate::wall::Wall;

pub mod angled;
pub mod deletion;
pub mod insertion;
pub mod lees_edwards;
pub mod periodic;

#[cfg(test)]
mod periodic_test;

pub use angled::AngledPeriodicBoundary;
pub use deletion::DeletionBoundary;
pub use insertion::{CubeInsertionBoundary, InsertionOutcome};
pub use lees_edwards::LeesEdwardsBoundary;
pub use periodic::PeriodicBoundary;

/// Which of a boundary's two faces a particle is nearest to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BoundaryId(pub usize);

/// What a boundary did to a particle that may have left the domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FoldOutcome {
    Inside,
    Folded {
        image: ImageOffset,
        rotation: UnitQuaternion<f64>,
    },
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Boundary {
    Periodic(PeriodicBoundary),
    LeesEdwards(LeesEdwardsBoundary),
    AngledPeriodic(AngledPeriodicBoundary),
    CubeInsertion(CubeInsertionBoundary),
    Deletion(DeletionBoundary),
}

impl Boundary {
    pub fn name(&self) -> &'static str {
        match self {
            Boundary::Periodic(_) => "periodic",
            Boundary::LeesEdwards(_) => "Lees-Edwards",
            Boundary::AngledPeriodic(_) => "angled periodic",
            Boundary::CubeInsertion(_) => "cube insertion",
            Boundary::Deletion(_) => "deletion",
        }
    }

    /// Number of image axes the boundary needs.
    pub fn image_axes(&self) -> usize {
        match self {
            Boundary::Periodic(_) | Boundary::AngledPeriodic(_) => 1,
            Boundary::LeesEdwards(_) => 2,
            Boundary::CubeInsertion(_) | Boundary::Deletion(_) => 0,
        }
    }

    fn bind_axis(&mut self, axis: usize) {
        match self {
            Boundary::Periodic(b) => b.axis = axis,
            Boundary::LeesEdwards(b) => b.axis = axis,
            Boundary::AngledPeriodic(b) => b.axis = axis,
            Boundary::CubeInsertion(_) | Boundary::Deletion(_) => {}
        }
    }

    pub fn validate(&self, species: &SpeciesTable) -> Result<(), ConfigError> {
        match self {
            Boundary::Periodic(b) => b.validate(),
            Boundary::LeesEdwards(b) => b.validate(),
            Boundary::AngledPeriodic(b) => b.validate(),
            Boundary::CubeInsertion(b) => b.validate(species),
            Boundary::Deletion(b) => b.validate(),
        }
    }

    /// Distance to the nearest face of a periodic-type boundary.
    pub fn distance_to(&self, particle: &Particle, time: f64) -> Option<(f64, Side)> {
        match self {
            Boundary::Periodic(b) => Some(b.distance_to(&particle.position)),
            Boundary::LeesEdwards(b) => Some(b.distance_to(&particle.position, time)),
            Boundary::AngledPeriodic(b) => Some(b.distance_to(&particle.position)),
            Boundary::CubeInsertion(_) | Boundary::Deletion(_) => None,
        }
    }

    /// Adds ghosts for particles near the boundary. Returns how many.
    pub fn create_ghosts(&self, particles: &mut ParticleRegistry, time: f64) -> usize {
        match self {
            Boundary::Periodic(b) => b.create_ghosts(particles),
            Boundary::LeesEdwards(b) => b.create_ghosts(particles, time),
            Boundary::AngledPeriodic(b) => b.create_ghosts(particles),
            Boundary::CubeInsertion(_) | Boundary::Deletion(_) => 0,
        }
    }

    /// One map per image axis; each map and its inverse reach the two
    /// neighbouring images along that axis.
    pub fn image_generators(&self, time: f64) -> Vec<ImageTransform> {
        match self {
            Boundary::Periodic(b) => b.image_generators(),
            Boundary::LeesEdwards(b) => b.image_generators(time),
            Boundary::AngledPeriodic(b) => b.image_generators(),
            Boundary::CubeInsertion(_) | Boundary::Deletion(_) => Vec::new(),
        }
    }

    /// Brings a real particle that left through this boundary back in, or
    /// asks for it to be removed.
    pub fn fold(&mut self, particle: &mut Particle, time: f64) -> FoldOutcome {
        match self {
            Boundary::Periodic(b) => b.fold(particle),
            Boundary::LeesEdwards(b) => b.fold(particle, time),
            Boundary::AngledPeriodic(b) => b.fold(particle),
            Boundary::Deletion(b) => b.fold(particle),
            Boundary::CubeInsertion(_) => FoldOutcome::Inside,
        }
    }
}

/// Inserts an image of `source` produced by `transform`, attributed to the
/// source's real master. Ghosts of ghosts compose images and transforms.
pub(crate) fn spawn_ghost(
    particles: &mut ParticleRegistry,
    source: ParticleId,
    step: ImageOffset,
    transform: &ImageTransform,
) -> Option<ParticleId> {
    let original = *particles.get(source)?;
    let (master, image, base) = original.origin(source);

    let mut ghost = original;
    ghost.position = transform.apply_point(&original.position);
    ghost.velocity = transform.apply_velocity(&original.velocity);
    ghost.angular_velocity = transform.apply_vector(&original.angular_velocity);
    ghost.orientation = transform.rotation * original.orientation;
    ghost.force = nalgebra::Vector3::zeros();
    ghost.torque = nalgebra::Vector3::zeros();
    ghost.role = Role::Ghost {
        master,
        image: image + step,
        transform: base.then(transform),
    };
    Some(particles.insert(ghost))
}

/// Applies a fold transform to a real particle in place.
pub(crate) fn apply_fold(particle: &mut Particle, transform: &ImageTransform) {
    particle.position = transform.apply_point(&particle.position);
    particle.velocity = transform.apply_velocity(&particle.velocity);
    particle.angular_velocity = transform.apply_vector(&particle.angular_velocity);
    particle.orientation = transform.rotation * particle.orientation;
}

/// Particles added or refused by insertion boundaries in one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertionReport {
    pub inserted: usize,
    /// Insertion boundaries that gave up after their failure budget.
    pub saturated: usize,
}

/// Folds and removals from one pass over the real particles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoldReport {
    pub folds: Vec<Fold>,
    pub removed: Vec<ParticleId>,
}

/// Ordered collection of boundaries and the image axes they own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRegistry {
    boundaries: Vec<Boundary>,
    axes_used: usize,
}

impl BoundaryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a boundary, assigning it fresh image axes.
    ///
    /// # Errors
    ///
    /// Fails when the image axes are exhausted or when a second angled
    /// periodic boundary is added.
    pub fn add(&mut self, mut boundary: Boundary) -> Result<BoundaryId, ConfigError> {
        let needed = boundary.image_axes();
        if self.axes_used + needed > MAX_IMAGE_AXES {
            return Err(ConfigError::TooManyImageAxes {
                requested: self.axes_used + needed,
                available: MAX_IMAGE_AXES,
            });
        }
        if matches!(boundary, Boundary::AngledPeriodic(_))
            && self
                .boundaries
                .iter()
                .any(|b| matches!(b, Boundary::AngledPeriodic(_)))
        {
            return Err(ConfigError::MultipleAngledBoundaries);
        }
        boundary.bind_axis(self.axes_used);
        self.axes_used += needed;
        self.boundaries.push(boundary);
        Ok(BoundaryId(self.boundaries.len() - 1))
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn get(&self, id: BoundaryId) -> Option<&Boundary> {
        self.boundaries.get(id.0)
    }

    pub fn get_mut(&mut self, id: BoundaryId) -> Option<&mut Boundary> {
        self.boundaries.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Boundary> {
        self.boundaries.iter()
    }

    pub fn validate(&self, species: &SpeciesTable) -> Result<(), ConfigError> {
        self.boundaries.iter().try_for_each(|b| b.validate(species))
    }

    /// Runs every insertion boundary.
    pub fn insert_particles(
        &mut self,
        particles: &mut ParticleRegistry,
        species: &SpeciesTable,
        walls: &[Wall],
        dimension: Dimension,
        time: f64,
    ) -> InsertionReport {
        let generators: Vec<ImageTransform> = self
            .boundaries
            .iter()
            .flat_map(|b| b.image_generators(time))
            .collect();
        let mut report = InsertionReport::default();
        for boundary in &mut self.boundaries {
            if let Boundary::CubeInsertion(insertion) = boundary {
                let outcome =
                    insertion.insert_among_images(particles, species, walls, &generators, dimension);
                report.inserted += outcome.inserted;
                if outcome.saturated {
                    report.saturated += 1;
                }
            }
        }
        report
    }

    /// Creates ghosts for every periodic-type boundary in registration
    /// order. Later boundaries also see ghosts made by earlier ones, which
    /// produces the corner and edge images.
    pub fn create_ghosts(&self, particles: &mut ParticleRegistry, time: f64) -> usize {
        self.boundaries
            .iter()
            .map(|b| b.create_ghosts(particles, time))
            .sum()
    }

    /// Folds escaped real particles back into the domain and removes those
    /// that crossed a deletion boundary.
    pub fn fold_all(&mut self, particles: &mut ParticleRegistry, time: f64) -> FoldReport {
        let mut report = FoldReport::default();
        if self.boundaries.is_empty() {
            return report;
        }

        for id in particles.real_ids() {
            let mut image = ImageOffset::ZERO;
            let mut rotation = UnitQuaternion::identity();
            let mut remove = false;

            let boundaries = &mut self.boundaries;
            particles.modify(id, |particle| {
                for boundary in boundaries.iter_mut() {
                    match boundary.fold(particle, time) {
                        FoldOutcome::Inside => {}
                        FoldOutcome::Folded {
                            image: step,
                            rotation: turn,
                        } => {
                            image += step;
                            rotation = turn * rotation;
                        }
                        FoldOutcome::Remove => {
                            remove = true;
                            break;
                        }
                    }
                }
            });

            if remove {
                particles.remove(id);
                report.removed.push(id);
            } else if !image.is_zero() || rotation != UnitQuaternion::identity() {
                report.folds.push(Fold {
                    particle: id,
                    image,
                    rotation,
                });
            }
        }
        report
    }
}
