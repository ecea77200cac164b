use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};

use crate::boundary::{Boundary, CubeInsertionBoundary};
use crate::config::{Dimension, SimulationConfig};
use crate::error::ConfigError;
use crate::particle::Particle;
use crate::simulation::Simulation;
use crate::species::{Species, SpeciesId};
use crate::wall::Wall;

fn config() -> SimulationConfig {
    SimulationConfig::default().with_dimension(Dimension::Three)
}

#[test]
fn test_validate_requires_species() {
    let sim = Simulation::new(config());
    assert_eq!(sim.validate(), Err(ConfigError::NoSpecies));
}

#[test]
fn test_validate_requires_dimension() {
    let mut sim = Simulation::new(SimulationConfig::default());
    sim.add_species(Species::frictionless(1000.0, 1e3, 0.0));
    assert_eq!(sim.validate(), Err(ConfigError::DimensionUnset));
}

#[test]
fn test_validate_checks_config_first() {
    let mut sim = Simulation::new(config().with_time_step(0.0));
    sim.add_species(Species::frictionless(1000.0, 1e3, 0.0));
    assert_eq!(sim.validate(), Err(ConfigError::NonPositiveTimeStep(0.0)));

    let sim = Simulation::new(config().with_save_every(0));
    assert_eq!(sim.validate(), Err(ConfigError::ZeroSaveCadence));
}

#[test]
fn test_validate_names_wall_with_unknown_species() {
    let mut sim = Simulation::new(config());
    sim.add_species(Species::frictionless(1000.0, 1e3, 0.0));
    sim.add_wall(Wall::plane(Vector3::z(), Point3::origin(), SpeciesId(0)));
    sim.add_wall(Wall::plane(Vector3::x(), Point3::origin(), SpeciesId(4)));

    let err = sim.validate().unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnknownSpecies {
            component: "wall 1".to_string(),
            species: 4
        }
    );
    assert_eq!(err.to_string(), "wall 1: unknown species 4");
}

#[test]
fn test_validate_checks_boundaries() {
    let mut sim = Simulation::new(config());
    sim.add_species(Species::frictionless(1000.0, 1e3, 0.0));
    sim.add_boundary(Boundary::CubeInsertion(CubeInsertionBoundary::new(
        Point3::origin(),
        Point3::new(1.0, 1.0, 1.0),
        SpeciesId(2),
        0.1,
        0.2,
        0,
    )))
    .unwrap();
    assert!(matches!(
        sim.validate(),
        Err(ConfigError::UnknownSpecies { species: 2, .. })
    ));
}

#[test]
fn test_add_particle_rejects_bad_input() {
    let mut sim = Simulation::new(config());
    let glass = sim.add_species(Species::frictionless(2500.0, 1e4, 0.0));

    assert!(matches!(
        sim.add_particle(Particle::new(SpeciesId(9), 0.1, Point3::origin())),
        Err(ConfigError::UnknownSpecies { species: 9, .. })
    ));
    assert!(matches!(
        sim.add_particle(Particle::new(glass, -0.1, Point3::origin())),
        Err(ConfigError::InvalidRadius { .. })
    ));
    assert!(matches!(
        sim.add_particle(Particle::new(glass, f64::NAN, Point3::origin())),
        Err(ConfigError::InvalidRadius { .. })
    ));
    assert!(sim.particles().is_empty());
}

#[test]
fn test_add_particle_derives_mass() {
    let mut sim = Simulation::new(SimulationConfig::default().with_dimension(Dimension::Two));
    let disk = sim.add_species(Species::frictionless(1.0, 1e4, 0.0));
    let id = sim
        .add_particle(Particle::new(disk, 2.0, Point3::origin()).with_interaction_radius(2.5))
        .unwrap();

    let p = sim.particles().get(id).unwrap();
    assert_relative_eq!(p.mass, std::f64::consts::PI * 4.0);
    assert_relative_eq!(p.inertia, 0.5 * p.mass * 4.0);
    assert_eq!(p.interaction_radius, 2.5);
}

#[test]
fn test_remove_particle_drops_its_interactions() {
    let mut sim = Simulation::new(config());
    let glass = sim.add_species(Species::frictionless(1.0, 1e3, 0.0));
    let a = sim.add_particle(Particle::new(glass, 0.5, Point3::origin())).unwrap();
    sim.add_particle(Particle::new(glass, 0.5, Point3::new(0.9, 0.0, 0.0)))
        .unwrap();

    sim.step();
    assert_eq!(sim.interactions().len(), 1);

    assert!(sim.remove_particle(a).is_some());
    assert!(sim.remove_particle(a).is_none());
    assert!(sim.interactions().is_empty());
    assert_eq!(sim.particles().len(), 1);
}

#[test]
fn test_energies_and_momentum() {
    let mut sim = Simulation::new(config().with_gravity(Vector3::new(0.0, 0.0, -10.0)));
    let s = sim.add_species(Species::frictionless(3.0 / (4.0 * std::f64::consts::PI), 1e3, 0.0));
    // unit radius at this density gives unit mass
    sim.add_particle(
        Particle::new(s, 1.0, Point3::new(0.0, 0.0, 2.0))
            .with_velocity(Vector3::new(3.0, 0.0, 0.0))
            .with_angular_velocity(Vector3::new(0.0, 0.0, 5.0)),
    )
    .unwrap();
    sim.add_particle(
        Particle::new(s, 1.0, Point3::new(10.0, 0.0, 0.0)).with_velocity(Vector3::new(-1.0, 2.0, 0.0)),
    )
    .unwrap();

    let e = sim.energies();
    assert_relative_eq!(e.kinetic, 0.5 * 9.0 + 0.5 * 5.0, epsilon = 1e-12);
    assert_relative_eq!(e.rotational, 0.5 * 0.4 * 25.0, epsilon = 1e-12);
    assert_relative_eq!(e.gravitational, 20.0, epsilon = 1e-12);
    assert_eq!(e.elastic, 0.0);
    assert_relative_eq!(e.total(), 4.5 + 2.5 + 5.0 + 20.0, epsilon = 1e-12);

    assert_relative_eq!(sim.total_momentum(), Vector3::new(2.0, 2.0, 0.0), epsilon = 1e-12);
}
