use approx::assert_relative_eq;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use std::f64::consts::PI;

use crate::config::Dimension;
use crate::image::{ImageOffset, ImageTransform};
use crate::integrator::VelocityVerlet;
use crate::particle::{Particle, ParticleId, Role};
use crate::species::SpeciesId;

fn make_particle(dimension: Dimension) -> Particle {
    let mut p = Particle::new(SpeciesId(0), 0.5, Point3::origin());
    p.set_mass_from_density(1.0, dimension);
    p
}

#[test]
fn test_constant_force_is_exact() {
    // velocity Verlet integrates constant acceleration without error
    let mut p = make_particle(Dimension::Three);
    let g = Vector3::new(0.0, 0.0, -9.81);
    p.force = g * p.mass;
    let verlet = VelocityVerlet::new(Dimension::Three);

    let dt = 0.01;
    for _ in 0..100 {
        verlet.integrate_before_force(&mut p, dt);
        verlet.integrate_after_force(&mut p, dt);
    }

    assert_relative_eq!(p.velocity, g, epsilon = 1e-12);
    assert_relative_eq!(p.position.z, 0.5 * g.z, epsilon = 1e-12);
}

#[test]
fn test_harmonic_oscillator_conserves_energy() {
    let mut p = make_particle(Dimension::Three);
    p.position.x = 0.1;
    let k = 100.0;
    let energy = |p: &Particle| p.kinetic_energy() + 0.5 * k * p.position.x.powi(2);
    let initial = energy(&p);

    let verlet = VelocityVerlet::new(Dimension::Three);
    let dt = 1e-3;
    p.force = Vector3::new(-k * p.position.x, 0.0, 0.0);
    for _ in 0..10_000 {
        verlet.integrate_before_force(&mut p, dt);
        p.force = Vector3::new(-k * p.position.x, 0.0, 0.0);
        verlet.integrate_after_force(&mut p, dt);
    }

    let drift = (energy(&p) - initial).abs() / initial;
    println!("relative energy drift: {drift:e}");
    assert!(drift < 1e-3);
}

#[test]
fn test_orientation_follows_spin() {
    let mut p = make_particle(Dimension::Three).with_angular_velocity(Vector3::new(0.0, 0.0, PI));
    let verlet = VelocityVerlet::new(Dimension::Three);
    for _ in 0..100 {
        verlet.integrate_before_force(&mut p, 0.01);
        verlet.integrate_after_force(&mut p, 0.01);
    }
    // half a turn about z
    let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI);
    assert!(p.orientation.angle_to(&expected) < 1e-6);
}

#[test]
fn test_torque_spins_up() {
    let mut p = make_particle(Dimension::Three);
    p.torque = Vector3::new(0.0, p.inertia, 0.0);
    let verlet = VelocityVerlet::new(Dimension::Three);
    verlet.integrate_before_force(&mut p, 0.1);
    verlet.integrate_after_force(&mut p, 0.1);
    assert_relative_eq!(p.angular_velocity, Vector3::new(0.0, 0.1, 0.0), epsilon = 1e-12);
}

#[test]
fn test_fixed_and_ghost_particles_do_not_move() {
    let verlet = VelocityVerlet::new(Dimension::Three);

    let mut fixed = make_particle(Dimension::Three)
        .with_velocity(Vector3::new(1.0, 0.0, 0.0))
        .fixed();
    fixed.force = Vector3::new(5.0, 0.0, 0.0);
    verlet.integrate_before_force(&mut fixed, 0.1);
    assert_eq!(fixed.position, Point3::origin());

    let mut ghost = make_particle(Dimension::Three).with_velocity(Vector3::new(1.0, 0.0, 0.0));
    ghost.role = Role::Ghost {
        master: ParticleId::default(),
        image: ImageOffset::along(0, 1),
        transform: ImageTransform::identity(),
    };
    verlet.integrate_before_force(&mut ghost, 0.1);
    assert_eq!(ghost.position, Point3::origin());
}

#[test]
fn test_two_dimensional_motion_stays_in_plane() {
    let mut p = make_particle(Dimension::Two)
        .with_velocity(Vector3::new(1.0, 0.0, 0.5))
        .with_angular_velocity(Vector3::new(1.0, 1.0, 2.0));
    p.force = Vector3::new(0.0, 0.0, 3.0);
    let verlet = VelocityVerlet::new(Dimension::Two);

    verlet.integrate_before_force(&mut p, 0.1);
    verlet.integrate_after_force(&mut p, 0.1);

    assert_eq!(p.position.z, 0.0);
    assert_eq!(p.velocity.z, 0.0);
    assert_eq!(p.angular_velocity, Vector3::new(0.0, 0.0, 2.0));
    assert_relative_eq!(p.position.x, 0.1, epsilon = 1e-12);
}
