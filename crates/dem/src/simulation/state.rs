//! Simulation state and setup.

use nalgebra::Vector3;

use crate::boundary::{Boundary, BoundaryId, BoundaryRegistry};
use crate::config::{Dimension, SimulationConfig};
use crate::error::ConfigError;
use crate::forces::{BodyForce, UniformGravity};
use crate::interaction::InteractionRegistry;
use crate::logging::RunLog;
use crate::particle::{Particle, ParticleId};
use crate::registry::ParticleRegistry;
use crate::species::{Species, SpeciesId, SpeciesTable};
use crate::wall::{Wall, WallId};

/// Energy budget of the real particles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Energies {
    pub kinetic: f64,
    pub rotational: f64,
    pub gravitational: f64,
    /// Energy stored in the springs of all current contacts.
    pub elastic: f64,
}

impl Energies {
    pub fn total(&self) -> f64 {
        self.kinetic + self.rotational + self.gravitational + self.elastic
    }
}

/// Complete state of one run.
///
/// # Examples
///
/// ```
/// use dem::config::{Dimension, SimulationConfig};
/// use dem::particle::Particle;
/// use dem::simulation::Simulation;
/// use dem::species::Species;
/// use nalgebra::Point3;
///
/// let mut sim = Simulation::new(SimulationConfig::default().with_dimension(Dimension::Two));
/// let glass = sim.add_species(Species::frictionless(2500.0, 1e4, 0.1));
/// let id = sim.add_particle(Particle::new(glass, 0.5, Point3::origin())).unwrap();
///
/// assert!(sim.validate().is_ok());
/// assert!(sim.particles().get(id).unwrap().mass > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Simulation {
    pub(crate) config: SimulationConfig,
    pub(crate) species: SpeciesTable,
    pub(crate) particles: ParticleRegistry,
    pub(crate) interactions: InteractionRegistry,
    pub(crate) walls: Vec<Wall>,
    pub(crate) boundaries: BoundaryRegistry,
    pub(crate) time: f64,
    pub(crate) step_count: u64,
    /// Set once the initial force pass has run.
    pub(crate) forces_primed: bool,
    pub(crate) last_saved_step: Option<u64>,
    pub(crate) log: RunLog,
}

impl Simulation {
    /// Creates an empty simulation. An unset dimension is only reported by
    /// [`Simulation::validate`]; storage is laid out for 3D meanwhile.
    pub fn new(config: SimulationConfig) -> Self {
        let dimension = config.dimension.unwrap_or(Dimension::Three);
        let particles = ParticleRegistry::new(dimension, config.hgrid);
        Simulation {
            config,
            species: SpeciesTable::new(),
            particles,
            interactions: InteractionRegistry::new(),
            walls: Vec::new(),
            boundaries: BoundaryRegistry::new(),
            time: 0.0,
            step_count: 0,
            forces_primed: false,
            last_saved_step: None,
            log: RunLog::default(),
        }
    }

    pub fn with_log(mut self, log: RunLog) -> Self {
        self.log = log;
        self
    }

    pub fn set_log(&mut self, log: RunLog) {
        self.log = log;
    }

    pub(crate) fn dimension(&self) -> Dimension {
        self.config.dimension.unwrap_or(Dimension::Three)
    }

    pub fn add_species(&mut self, species: Species) -> SpeciesId {
        self.species.add(species)
    }

    /// Overrides the law between two species. Returns `false` if either is
    /// unknown.
    pub fn set_mixed_species(&mut self, a: SpeciesId, b: SpeciesId, species: Species) -> bool {
        self.species.set_mixed(a, b, species)
    }

    /// Adds a real particle, deriving its mass and inertia from the species
    /// density.
    ///
    /// # Errors
    ///
    /// Fails for an unknown species or a negative or non-finite radius.
    pub fn add_particle(&mut self, mut particle: Particle) -> Result<ParticleId, ConfigError> {
        let Some(species) = self.species.get(particle.species) else {
            return Err(ConfigError::UnknownSpecies {
                component: "particle".to_string(),
                species: particle.species.0,
            });
        };
        if !(particle.radius >= 0.0 && particle.radius.is_finite()) {
            return Err(ConfigError::InvalidRadius {
                component: "particle".to_string(),
                radius: particle.radius,
            });
        }
        particle.role = crate::particle::Role::Real;
        particle.interaction_radius = particle.interaction_radius.max(particle.radius);
        particle.set_mass_from_density(species.density, self.dimension());
        Ok(self.particles.insert(particle))
    }

    /// Removes a real particle together with its interactions.
    pub fn remove_particle(&mut self, id: ParticleId) -> Option<Particle> {
        let removed = self.particles.remove(id)?;
        self.interactions.purge_missing(&self.particles);
        self.particles.normalize_free_slots();
        Some(removed)
    }

    pub fn add_wall(&mut self, wall: Wall) -> WallId {
        self.walls.push(wall);
        WallId(self.walls.len() - 1)
    }

    pub fn add_boundary(&mut self, boundary: Boundary) -> Result<BoundaryId, ConfigError> {
        self.boundaries.add(boundary)
    }

    /// Checks everything that can be checked before the first step.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found in the run parameters, the
    /// species table, the particles, the walls or the boundaries.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        if self.species.is_empty() {
            return Err(ConfigError::NoSpecies);
        }
        if let Some((_, p)) = self
            .particles
            .iter()
            .find(|(_, p)| !self.species.contains(p.species))
        {
            return Err(ConfigError::UnknownSpecies {
                component: "particle".to_string(),
                species: p.species.0,
            });
        }
        if let Some((index, wall)) = self
            .walls
            .iter()
            .enumerate()
            .find(|(_, w)| !self.species.contains(w.species))
        {
            return Err(ConfigError::UnknownSpecies {
                component: format!("wall {index}"),
                species: wall.species.0,
            });
        }
        self.boundaries.validate(&self.species)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn particles(&self) -> &ParticleRegistry {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleRegistry {
        &mut self.particles
    }

    pub fn interactions(&self) -> &InteractionRegistry {
        &self.interactions
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn walls_mut(&mut self) -> &mut [Wall] {
        &mut self.walls
    }

    pub fn boundaries(&self) -> &BoundaryRegistry {
        &self.boundaries
    }

    pub fn boundaries_mut(&mut self) -> &mut BoundaryRegistry {
        &mut self.boundaries
    }

    pub fn species(&self) -> &SpeciesTable {
        &self.species
    }

    pub(crate) fn gravity(&self) -> UniformGravity {
        UniformGravity::new(self.config.gravity)
    }

    /// Energy budget of the real particles and current contacts.
    pub fn energies(&self) -> Energies {
        let gravity = self.gravity();
        let mut energies = self
            .particles
            .iter_real()
            .fold(Energies::default(), |mut acc, (_, p)| {
                acc.kinetic += p.kinetic_energy();
                acc.rotational += p.rotational_energy();
                acc.gravitational += gravity.potential_energy(p);
                acc
            });
        energies.elastic = self.interactions.iter().map(|i| i.elastic_energy).sum();
        energies
    }

    pub fn total_momentum(&self) -> Vector3<f64> {
        self.particles
            .iter_real()
            .map(|(_, p)| p.momentum())
            .fold(Vector3::zeros(), |acc, m| acc + m)
    }
}
