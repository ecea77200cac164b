use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};

use crate::boundary::{Boundary, BoundaryRegistry, FoldOutcome, PeriodicBoundary};
use crate::config::Dimension;
use crate::error::ConfigError;
use crate::hgrid::HGridSettings;
use crate::image::ImageOffset;
use crate::particle::{Particle, Role};
use crate::registry::ParticleRegistry;
use crate::species::SpeciesId;

fn registry() -> ParticleRegistry {
    ParticleRegistry::new(Dimension::Three, HGridSettings::default())
}

fn ghost_images(particles: &ParticleRegistry) -> Vec<ImageOffset> {
    let mut images: Vec<_> = particles
        .iter()
        .filter_map(|(_, p)| match p.role {
            Role::Ghost { image, .. } => Some(image),
            Role::Real => None,
        })
        .collect();
    images.sort();
    images
}

#[test]
fn test_one_ghost_only_within_range() {
    let boundary = PeriodicBoundary::new(Vector3::x(), 0.0, 10.0);

    let mut near = registry();
    let id = near.insert(
        Particle::new(SpeciesId(0), 0.5, Point3::new(0.9, 5.0, 5.0))
            .with_velocity(Vector3::new(1.0, 2.0, 3.0)),
    );
    assert_eq!(boundary.create_ghosts(&mut near), 1);
    let (_, ghost) = near.iter().find(|(_, p)| p.is_ghost()).unwrap();
    assert_relative_eq!(ghost.position.x, 10.9);
    assert_eq!(ghost.velocity, Vector3::new(1.0, 2.0, 3.0));
    match ghost.role {
        Role::Ghost { master, image, .. } => {
            assert_eq!(master, id);
            assert_eq!(image, ImageOffset::along(0, 1));
        }
        Role::Real => unreachable!(),
    }

    let mut far = registry();
    far.insert(Particle::new(SpeciesId(0), 0.5, Point3::new(1.1, 5.0, 5.0)));
    assert_eq!(boundary.create_ghosts(&mut far), 0);
}

#[test]
fn test_right_side_ghost_goes_left() {
    let boundary = PeriodicBoundary::new(Vector3::x(), 0.0, 10.0);
    let mut particles = registry();
    particles.insert(Particle::new(SpeciesId(0), 0.5, Point3::new(9.5, 0.0, 0.0)));
    boundary.create_ghosts(&mut particles);

    let (_, ghost) = particles.iter().find(|(_, p)| p.is_ghost()).unwrap();
    assert_relative_eq!(ghost.position.x, -0.5);
    assert_eq!(ghost_images(&particles), vec![ImageOffset::along(0, -1)]);
}

#[test]
fn test_ghost_range_uses_largest_radius() {
    let boundary = PeriodicBoundary::new(Vector3::x(), 0.0, 10.0);
    let mut particles = registry();
    particles.insert(Particle::new(SpeciesId(0), 0.1, Point3::new(1.5, 0.0, 0.0)));
    particles.insert(Particle::new(SpeciesId(0), 2.0, Point3::new(5.0, 0.0, 0.0)));
    // 1.5 < 0.1 + 2.0 even though the small particle is far from its own reach
    assert_eq!(boundary.create_ghosts(&mut particles), 1);
}

#[test]
fn test_corner_ghosts_from_two_boundaries() {
    let mut boundaries = BoundaryRegistry::new();
    boundaries
        .add(Boundary::Periodic(PeriodicBoundary::new(Vector3::x(), 0.0, 10.0)))
        .unwrap();
    boundaries
        .add(Boundary::Periodic(PeriodicBoundary::new(Vector3::y(), 0.0, 10.0)))
        .unwrap();

    let mut particles = registry();
    particles.insert(Particle::new(SpeciesId(0), 0.5, Point3::new(0.2, 0.2, 5.0)));
    assert_eq!(boundaries.create_ghosts(&mut particles, 0.0), 3);

    let mut expected = vec![
        ImageOffset::along(0, 1),
        ImageOffset::along(1, 1),
        ImageOffset::along(0, 1) + ImageOffset::along(1, 1),
    ];
    expected.sort();
    assert_eq!(ghost_images(&particles), expected);

    let diagonal = particles
        .iter()
        .find(|(_, p)| matches!(p.role, Role::Ghost { image, .. } if image.steps(0) == 1 && image.steps(1) == 1))
        .map(|(_, p)| p.position)
        .unwrap();
    assert_relative_eq!(diagonal, Point3::new(10.2, 10.2, 5.0));
}

#[test]
fn test_fold_wraps_into_half_open_slab() {
    let boundary = PeriodicBoundary::new(Vector3::x(), 0.0, 10.0);

    let mut p = Particle::new(SpeciesId(0), 0.5, Point3::new(10.3, 1.0, 0.0));
    match boundary.fold(&mut p) {
        FoldOutcome::Folded { image, .. } => assert_eq!(image, ImageOffset::along(0, -1)),
        other => panic!("expected a fold, got {other:?}"),
    }
    assert_relative_eq!(p.position.x, 0.3, epsilon = 1e-12);

    let mut q = Particle::new(SpeciesId(0), 0.5, Point3::new(-0.2, 1.0, 0.0));
    assert!(matches!(boundary.fold(&mut q), FoldOutcome::Folded { .. }));
    assert_relative_eq!(q.position.x, 9.8, epsilon = 1e-12);

    // the right plane belongs to the next period
    let mut r = Particle::new(SpeciesId(0), 0.5, Point3::new(10.0, 1.0, 0.0));
    assert!(matches!(boundary.fold(&mut r), FoldOutcome::Folded { .. }));
    assert_eq!(r.position.x, 0.0);

    let mut inside = Particle::new(SpeciesId(0), 0.5, Point3::new(0.0, 1.0, 0.0));
    assert_eq!(boundary.fold(&mut inside), FoldOutcome::Inside);
}

#[test]
fn test_oblique_boundary_between_points() {
    let boundary = PeriodicBoundary::between(
        Vector3::new(0.0, 2.0, 0.0),
        &Point3::new(0.0, -1.0, 0.0),
        &Point3::new(0.0, 3.0, 0.0),
    );
    assert_eq!(boundary.normal(), Vector3::y());
    assert_eq!(boundary.planes(), (-1.0, 3.0));
    assert_eq!(boundary.period(), 4.0);
}

#[test]
fn test_invalid_period_is_rejected() {
    let mut boundary = PeriodicBoundary::new(Vector3::x(), 0.0, 10.0);
    assert!(boundary.validate().is_ok());
    boundary.move_planes(5.0, 5.0);
    assert!(matches!(
        boundary.validate(),
        Err(ConfigError::InvalidBoundary { boundary: "periodic", .. })
    ));
}

#[test]
fn test_registry_limits_image_axes() {
    let mut boundaries = BoundaryRegistry::new();
    for _ in 0..4 {
        boundaries
            .add(Boundary::Periodic(PeriodicBoundary::new(Vector3::x(), 0.0, 1.0)))
            .unwrap();
    }
    let err = boundaries
        .add(Boundary::Periodic(PeriodicBoundary::new(Vector3::y(), 0.0, 1.0)))
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::TooManyImageAxes {
            requested: 5,
            available: 4
        }
    );
    assert_eq!(boundaries.len(), 4);
}
