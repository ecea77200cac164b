//! Smoke test: particles poured onto an inclined periodic chute.

use nalgebra::{Point3, Vector3};

use dem::boundary::{Boundary, CubeInsertionBoundary, PeriodicBoundary};
use dem::config::{Dimension, SimulationConfig};
use dem::logging::RunLog;
use dem::output::{ContactWriter, EnergyWriter, Outputs, TrajectoryWriter};
use dem::simulation::{Simulation, StopReason};
use dem::species::{LinearViscoelastic, SlidingFriction, Species};
use dem::wall::Wall;

const LENGTH: f64 = 0.2;
const WIDTH: f64 = 0.1;

#[test]
fn polydisperse_chute_flow() {
    let theta = 24f64.to_radians();
    let config = SimulationConfig::new("chute")
        .with_dimension(Dimension::Three)
        .with_time_step(2e-5)
        .with_max_time(0.05)
        .with_save_every(250)
        .with_domain(Point3::origin(), Point3::new(LENGTH, WIDTH, 0.1))
        .with_gravity(Vector3::new(theta.sin(), 0.0, -theta.cos()) * 9.81);
    let mut sim = Simulation::new(config).with_log(RunLog::Silent);

    let mass = 2000.0 * Dimension::Three.volume(0.004);
    let normal = LinearViscoelastic::from_collision_time(1e-3, 0.6, 0.5 * mass);
    let sand = sim.add_species(Species::new(2000.0, normal).with_sliding_friction(SlidingFriction {
        stiffness: 2.0 / 7.0 * normal.stiffness,
        dissipation: 2.0 / 7.0 * normal.dissipation,
        coefficient: 0.5,
    }));

    sim.add_wall(Wall::plane(Vector3::z(), Point3::origin(), sand));
    sim.add_boundary(Boundary::Periodic(PeriodicBoundary::new(Vector3::x(), 0.0, LENGTH)))
        .unwrap();
    sim.add_boundary(Boundary::Periodic(PeriodicBoundary::new(Vector3::y(), 0.0, WIDTH)))
        .unwrap();
    sim.add_boundary(Boundary::CubeInsertion(
        CubeInsertionBoundary::new(
            Point3::origin(),
            Point3::new(LENGTH, WIDTH, 0.05),
            sand,
            0.002,
            0.006,
            7,
        )
        .with_velocity_range(Vector3::new(0.0, 0.0, -0.1), Vector3::zeros())
        .with_max_failed_attempts(100)
        .with_max_particles(150),
    ))
    .unwrap();

    let mut outputs = Outputs::none()
        .with_sink(TrajectoryWriter::new(std::io::sink()))
        .with_sink(ContactWriter::new(std::io::sink()))
        .with_sink(EnergyWriter::new(std::io::sink()));
    let summary = sim.solve(&mut outputs).unwrap();
    let energies = sim.energies();

    println!("\n=== Chute ===");
    println!("{summary:?}");
    println!("particles: {}", sim.particles().len());
    println!("contacts: {}", sim.interactions().len());
    println!("energies: {energies:?}");

    assert_eq!(summary.stop, StopReason::EndTime);
    assert_eq!(summary.saves, 2500 / 250 + 1);
    assert_eq!(sim.particles().len(), 150);
    assert_eq!(sim.particles().ghost_count(), 0);
    for (_, p) in sim.particles().iter() {
        assert!(p.position.iter().all(|c| c.is_finite()));
        assert!((0.0..LENGTH).contains(&p.position.x));
        assert!((0.0..WIDTH).contains(&p.position.y));
        assert!(p.position.z > 0.0);
    }
    assert!(energies.total().is_finite());
    assert!(energies.kinetic > 0.0);
    // everything is falling down the slope
    assert!(sim.total_momentum().x > 0.0);
}
