use log::Level;
use nalgebra::{Point3, Vector3};

use crate::boundary::{Boundary, CubeInsertionBoundary, PeriodicBoundary};
use crate::config::{Dimension, SimulationConfig};
use crate::error::DemError;
use crate::logging::RunLog;
use crate::output::{load_checkpoint, read_checkpoint, save_checkpoint, write_checkpoint};
use crate::particle::{Particle, ParticleId};
use crate::simulation::Simulation;
use crate::species::{SlidingFriction, Species, SpeciesId};
use crate::wall::Wall;

fn busy_simulation() -> Simulation {
    let config = SimulationConfig::new("box")
        .with_dimension(Dimension::Three)
        .with_time_step(1e-4)
        .with_gravity(Vector3::new(0.0, 0.0, -9.81));
    let mut sim = Simulation::new(config).with_log(RunLog::Silent);
    let sand = sim.add_species(
        Species::frictionless(2000.0, 1e4, 1.0).with_sliding_friction(SlidingFriction {
            stiffness: 2e3,
            dissipation: 0.2,
            coefficient: 0.5,
        }),
    );
    sim.add_wall(Wall::plane(Vector3::z(), Point3::origin(), sand));
    sim.add_boundary(Boundary::Periodic(PeriodicBoundary::new(Vector3::x(), 0.0, 0.2)))
        .unwrap();
    sim.add_boundary(Boundary::CubeInsertion(
        CubeInsertionBoundary::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.2, 0.2, 0.1),
            sand,
            0.01,
            0.02,
            17,
        )
        .with_max_particles(40),
    ))
    .unwrap();
    sim.add_particle(Particle::new(sand, 0.02, Point3::new(0.1, 0.1, 0.015)))
        .unwrap();
    sim
}

fn particle_state(sim: &Simulation) -> Vec<(ParticleId, Particle)> {
    sim.particles().iter().map(|(id, p)| (id, *p)).collect()
}

#[test]
fn test_round_trip_restores_state() {
    let mut sim = busy_simulation();
    for _ in 0..30 {
        sim.step();
    }
    // free a slot so the restored free list matters
    let victim = sim.particles().real_ids()[3];
    sim.remove_particle(victim);

    let mut buffer = Vec::new();
    write_checkpoint(&sim, &mut buffer).unwrap();
    println!("checkpoint: {} bytes", buffer.len());
    let restored = read_checkpoint(buffer.as_slice()).unwrap();

    assert_eq!(restored.time(), sim.time());
    assert_eq!(restored.step_count(), sim.step_count());
    assert_eq!(restored.config(), sim.config());
    assert_eq!(restored.species(), sim.species());
    assert_eq!(restored.walls(), sim.walls());
    assert_eq!(restored.boundaries(), sim.boundaries());
    assert_eq!(restored.interactions(), sim.interactions());
    assert_eq!(particle_state(&restored), particle_state(&sim));
    assert_eq!(restored.particles().slot_count(), sim.particles().slot_count());
}

#[test]
fn test_restored_run_continues_identically() {
    let mut sim = busy_simulation();
    for _ in 0..20 {
        sim.step();
    }
    let mut buffer = Vec::new();
    write_checkpoint(&sim, &mut buffer).unwrap();
    let mut restored = read_checkpoint(buffer.as_slice()).unwrap();

    for _ in 0..20 {
        assert_eq!(restored.step(), sim.step());
    }
    // a new particle must land in the same slot in both runs
    let extra = Particle::new(SpeciesId(0), 0.01, Point3::new(0.05, 0.15, 0.18));
    assert_eq!(
        restored.add_particle(extra).unwrap(),
        sim.add_particle(extra).unwrap()
    );
    assert_eq!(particle_state(&restored), particle_state(&sim));
    assert_eq!(restored.interactions(), sim.interactions());
}

#[test]
fn test_unknown_version_is_rejected() {
    let sim = busy_simulation();
    let mut buffer = Vec::new();
    write_checkpoint(&sim, &mut buffer).unwrap();

    let mut value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
    value["format_version"] = serde_json::json!(7);
    let edited = serde_json::to_vec(&value).unwrap();

    match read_checkpoint(edited.as_slice()) {
        Err(DemError::UnsupportedCheckpointVersion { found, expected }) => {
            assert_eq!(found, 7);
            assert_eq!(expected, 1);
        }
        other => panic!("expected a version error, got {:?}", other.map(|s| s.step_count())),
    }
}

#[test]
fn test_garbage_is_an_error() {
    assert!(matches!(
        read_checkpoint("not json".as_bytes()),
        Err(DemError::Checkpoint(_))
    ));
}

#[test]
fn test_missing_file_means_fresh_start() {
    let path = std::env::temp_dir().join("dem-checkpoint-that-does-not-exist.restart");
    let (log, memory) = RunLog::capture();
    assert!(load_checkpoint(&path, &log).unwrap().is_none());
    assert!(memory
        .records()
        .iter()
        .any(|(level, message)| *level == Level::Warn && message.starts_with("no restart file at")));
}

#[test]
fn test_save_and_load_file() {
    let path = std::env::temp_dir().join(format!("dem-checkpoint-{}.restart", std::process::id()));
    let mut sim = busy_simulation();
    sim.step();

    save_checkpoint(&sim, &path).unwrap();
    let restored = load_checkpoint(&path, &RunLog::Silent).unwrap().expect("file was just written");
    assert_eq!(restored.step_count(), 1);
    assert_eq!(particle_state(&restored), particle_state(&sim));
    std::fs::remove_file(&path).unwrap();
}
