use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};

use crate::config::Dimension;
use crate::forces::{compute_forces, BodyForce, ForceContext, UniformGravity};
use crate::hgrid::HGridSettings;
use crate::image::{ImageOffset, ImageTransform};
use crate::interaction::InteractionRegistry;
use crate::particle::{Particle, Role};
use crate::registry::ParticleRegistry;
use crate::species::{Species, SpeciesId, SpeciesTable};

#[test]
fn test_force_scales_with_mass() {
    let gravity = UniformGravity::new(Vector3::new(0.0, -9.81, 0.0));
    let mut p = Particle::new(SpeciesId(0), 0.1, Point3::origin());
    p.mass = 2.0;
    assert_relative_eq!(gravity.force(&p), Vector3::new(0.0, -19.62, 0.0));
}

#[test]
fn test_potential_energy_decreases_downhill() {
    let gravity = UniformGravity::new(Vector3::new(0.0, 0.0, -10.0));
    let mut high = Particle::new(SpeciesId(0), 0.1, Point3::new(0.0, 0.0, 3.0));
    high.mass = 1.0;
    let mut low = high;
    low.position.z = 1.0;

    assert_relative_eq!(gravity.potential_energy(&high) - gravity.potential_energy(&low), 20.0);
}

#[test]
fn test_tilted_gravity_pulls_along_slope() {
    let theta = 30f64.to_radians();
    let gravity = UniformGravity::new(Vector3::new(theta.sin(), 0.0, -theta.cos()) * 9.81);
    let mut p = Particle::new(SpeciesId(0), 0.1, Point3::origin());
    p.mass = 1.0;
    assert_relative_eq!(gravity.force(&p).x, 9.81 * 0.5, epsilon = 1e-12);
}

#[test]
fn test_only_movable_real_particles_feel_gravity() {
    let mut species = SpeciesTable::new();
    species.add(Species::frictionless(1.0, 1000.0, 0.0));
    let gravity = UniformGravity::new(Vector3::new(0.0, 0.0, -10.0));
    let ctx = ForceContext {
        species: &species,
        walls: &[],
        body_force: &gravity,
        time: 0.0,
        dt: 1e-3,
    };

    let mut particles = ParticleRegistry::new(Dimension::Three, HGridSettings::default());
    let mut free = Particle::new(SpeciesId(0), 0.1, Point3::origin());
    free.set_mass_from_density(1.0, Dimension::Three);
    let free_id = particles.insert(free);

    let mut anchor = Particle::new(SpeciesId(0), 0.1, Point3::new(5.0, 0.0, 0.0)).fixed();
    anchor.set_mass_from_density(1.0, Dimension::Three);
    let anchor_id = particles.insert(anchor);

    let mut ghost = free;
    ghost.position.y = 5.0;
    ghost.role = Role::Ghost {
        master: free_id,
        image: ImageOffset::along(0, 1),
        transform: ImageTransform::translation(Vector3::new(0.0, 5.0, 0.0)),
    };
    let ghost_id = particles.insert(ghost);

    compute_forces(&mut particles, &mut InteractionRegistry::new(), &ctx);

    assert_relative_eq!(particles.get(free_id).unwrap().force.z, -10.0 * free.mass);
    assert_eq!(particles.get(anchor_id).unwrap().force, Vector3::zeros());
    assert_eq!(particles.get(ghost_id).unwrap().force, Vector3::zeros());
}
