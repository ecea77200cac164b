//! Cuboid insertion boundary.
//!
//! Each step the boundary keeps proposing random particles inside its box
//! until a run of consecutive failed placements reaches the failure budget.
//! A proposal fails if it would overlap an existing particle or a wall. The
//! random stream is part of the boundary's state so a restarted run makes
//! exactly the same proposals.

use nalgebra::{Point3, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::Dimension;
use crate::error::ConfigError;
use crate::image::ImageTransform;
use crate::particle::Particle;
use crate::registry::ParticleRegistry;
use crate::species::{SpeciesId, SpeciesTable};
use crate::wall::Wall;

/// Result of one insertion sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertionOutcome {
    pub inserted: usize,
    /// Failed attempts at the end of the sweep.
    pub failed_attempts: u32,
    /// The sweep stopped because the failure budget ran out.
    pub saturated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeInsertionBoundary {
    min: Point3<f64>,
    max: Point3<f64>,
    species: SpeciesId,
    radius_min: f64,
    radius_max: f64,
    velocity_min: Vector3<f64>,
    velocity_max: Vector3<f64>,
    max_failed_attempts: u32,
    max_particles: Option<u64>,
    inserted: u64,
    rng: ChaCha8Rng,
}

fn sample(rng: &mut ChaCha8Rng, low: f64, high: f64) -> f64 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

impl CubeInsertionBoundary {
    /// Inserts particles of `species` with radii in `[radius_min, radius_max)`
    /// into the box `[min, max]`, seeded for reproducibility.
    ///
    /// # Examples
    ///
    /// ```
    /// use dem::boundary::CubeInsertionBoundary;
    /// use dem::species::SpeciesId;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let hopper = CubeInsertionBoundary::new(
    ///     Point3::new(0.0, 0.0, 1.0),
    ///     Point3::new(1.0, 1.0, 2.0),
    ///     SpeciesId(0),
    ///     0.01,
    ///     0.02,
    ///     42,
    /// )
    /// .with_velocity_range(Vector3::new(0.0, 0.0, -1.0), Vector3::new(0.0, 0.0, -0.5))
    /// .with_max_failed_attempts(50)
    /// .with_max_particles(1_000);
    ///
    /// assert_eq!(hopper.inserted(), 0);
    /// ```
    pub fn new(
        min: Point3<f64>,
        max: Point3<f64>,
        species: SpeciesId,
        radius_min: f64,
        radius_max: f64,
        seed: u64,
    ) -> Self {
        Self {
            min,
            max,
            species,
            radius_min,
            radius_max,
            velocity_min: Vector3::zeros(),
            velocity_max: Vector3::zeros(),
            max_failed_attempts: 20,
            max_particles: None,
            inserted: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn with_velocity_range(mut self, min: Vector3<f64>, max: Vector3<f64>) -> Self {
        self.velocity_min = min;
        self.velocity_max = max;
        self
    }

    pub fn with_max_failed_attempts(mut self, attempts: u32) -> Self {
        self.max_failed_attempts = attempts;
        self
    }

    pub fn with_max_particles(mut self, count: u64) -> Self {
        self.max_particles = Some(count);
        self
    }

    /// Total particles inserted by this boundary.
    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    pub fn validate(&self, species: &SpeciesTable) -> Result<(), ConfigError> {
        if !species.contains(self.species) {
            return Err(ConfigError::UnknownSpecies {
                component: "cube insertion boundary".to_string(),
                species: self.species.0,
            });
        }
        if !(self.radius_min > 0.0 && self.radius_max >= self.radius_min && self.radius_max.is_finite()) {
            return Err(ConfigError::InvalidBoundary {
                boundary: "cube insertion",
                reason: format!(
                    "radius range [{}, {}) must be positive and ordered",
                    self.radius_min, self.radius_max
                ),
            });
        }
        if (0..3).any(|k| !(self.max[k] >= self.min[k])) {
            return Err(ConfigError::InvalidBoundary {
                boundary: "cube insertion",
                reason: "box max must not lie below box min".to_string(),
            });
        }
        Ok(())
    }

    fn propose(&mut self, dimension: Dimension) -> Particle {
        let radius = sample(&mut self.rng, self.radius_min, self.radius_max);
        let mut position = Point3::origin();
        let mut velocity = Vector3::zeros();
        for k in 0..dimension.axes() {
            let (low, high) = (self.min[k] + radius, self.max[k] - radius);
            position[k] = if high > low {
                sample(&mut self.rng, low, high)
            } else {
                0.5 * (self.min[k] + self.max[k])
            };
            velocity[k] = sample(&mut self.rng, self.velocity_min[k], self.velocity_max[k]);
        }
        Particle::new(self.species, radius, position).with_velocity(velocity)
    }

    fn obstructed(
        particle: &Particle,
        particles: &ParticleRegistry,
        walls: &[Wall],
        generators: &[ImageTransform],
    ) -> bool {
        if walls
            .iter()
            .any(|w| w.distance_and_normal(&particle.position, particle.radius).is_some())
        {
            return true;
        }
        // an image of the candidate touching a particle is the same overlap
        // as that particle's image touching the candidate
        let mut positions = vec![particle.position];
        for generator in generators {
            let shifted: Vec<Point3<f64>> = positions
                .iter()
                .flat_map(|p| [generator.apply_point(p), generator.unapply_point(p)])
                .collect();
            positions.extend(shifted);
        }
        positions
            .iter()
            .any(|p| particles.overlaps_any(p, particle.radius))
    }

    /// Runs one insertion sweep, ignoring periodic images.
    pub fn insert(
        &mut self,
        particles: &mut ParticleRegistry,
        species: &SpeciesTable,
        walls: &[Wall],
        dimension: Dimension,
    ) -> InsertionOutcome {
        self.insert_among_images(particles, species, walls, &[], dimension)
    }

    /// Runs one insertion sweep. A candidate is refused if it or any of its
    /// images under `generators` (each applied forwards and backwards, in
    /// every combination) overlaps a particle.
    pub fn insert_among_images(
        &mut self,
        particles: &mut ParticleRegistry,
        species: &SpeciesTable,
        walls: &[Wall],
        generators: &[ImageTransform],
        dimension: Dimension,
    ) -> InsertionOutcome {
        let mut outcome = InsertionOutcome::default();
        let Some(density) = species.get(self.species).map(|s| s.density) else {
            return outcome;
        };

        loop {
            if self.max_particles.is_some_and(|cap| self.inserted >= cap) {
                break;
            }
            if outcome.failed_attempts >= self.max_failed_attempts {
                outcome.saturated = true;
                break;
            }

            let mut candidate = self.propose(dimension);
            if Self::obstructed(&candidate, particles, walls, generators) {
                outcome.failed_attempts += 1;
                continue;
            }

            candidate.set_mass_from_density(density, dimension);
            particles.insert(candidate);
            self.inserted += 1;
            outcome.inserted += 1;
            outcome.failed_attempts = 0;
        }
        outcome
    }
}
