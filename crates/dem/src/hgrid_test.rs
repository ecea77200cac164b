use nalgebra::Point3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::Dimension;
use crate::hgrid::HGridSettings;
use crate::particle::{Particle, ParticleId};
use crate::registry::ParticleRegistry;
use crate::species::SpeciesId;

fn registry(dimension: Dimension) -> ParticleRegistry {
    ParticleRegistry::new(dimension, HGridSettings::default())
}

fn brute_force_contacts(particles: &ParticleRegistry) -> Vec<(ParticleId, ParticleId)> {
    let all: Vec<_> = particles.iter().collect();
    let mut pairs = Vec::new();
    for (i, (a, pa)) in all.iter().enumerate() {
        for (b, pb) in &all[i + 1..] {
            if pa.distance_to(pb) < pa.interaction_radius + pb.interaction_radius {
                pairs.push(if a < b { (*a, *b) } else { (*b, *a) });
            }
        }
    }
    pairs.sort_unstable();
    pairs
}

#[test]
fn test_monodisperse_uses_one_level() {
    let mut particles = registry(Dimension::Three);
    for i in 0..10 {
        particles.insert(Particle::new(
            SpeciesId(0),
            0.5,
            Point3::new(i as f64, 0.0, 0.0),
        ));
    }
    assert_eq!(particles.index().level_count(), 1);
    assert_eq!(particles.index().cell_size(0), Some(1.0));
    assert_eq!(particles.index().len(), 10);
}

#[test]
fn test_polydisperse_levels_are_capped() {
    let mut particles = registry(Dimension::Three);
    for (i, &r) in [0.01, 0.05, 0.2, 1.0].iter().enumerate() {
        particles.insert(Particle::new(
            SpeciesId(0),
            r,
            Point3::new(3.0 * i as f64, 0.0, 0.0),
        ));
    }
    let index = particles.index();
    assert_eq!(index.level_count(), 3);
    // the largest level holds exactly the largest diameter
    assert_eq!(index.cell_size(2), Some(2.0));

    let levels: Vec<usize> = particles
        .iter()
        .map(|(id, _)| index.level_of(id).unwrap())
        .collect();
    assert!(levels.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(levels[0], 0);
    assert_eq!(levels[3], 2);
}

#[test]
fn test_insert_within_range_does_not_rebuild() {
    let mut particles = registry(Dimension::Three);
    particles.insert(Particle::new(SpeciesId(0), 0.1, Point3::origin()));
    particles.insert(Particle::new(SpeciesId(0), 0.2, Point3::new(1.0, 0.0, 0.0)));
    let rebuilds = particles.index().rebuild_count();

    particles.insert(Particle::new(SpeciesId(0), 0.15, Point3::new(2.0, 0.0, 0.0)));
    assert_eq!(particles.index().rebuild_count(), rebuilds);

    // larger than anything seen so far forces a rebuild
    particles.insert(Particle::new(SpeciesId(0), 0.5, Point3::new(4.0, 0.0, 0.0)));
    assert_eq!(particles.index().rebuild_count(), rebuilds + 1);
    assert_eq!(particles.index().len(), 4);
}

#[test]
fn test_update_moves_particle_between_cells() {
    let mut particles = registry(Dimension::Three);
    let a = particles.insert(Particle::new(SpeciesId(0), 0.5, Point3::origin()));
    let b = particles.insert(Particle::new(SpeciesId(0), 0.5, Point3::new(10.0, 0.0, 0.0)));
    assert!(particles.candidate_pairs().is_empty());

    particles.modify(b, |p| p.position = Point3::new(0.9, 0.0, 0.0));
    assert_eq!(particles.candidate_pairs(), vec![if a < b { (a, b) } else { (b, a) }]);

    particles.remove(b);
    assert!(!particles.index().contains(b));
    assert!(particles.candidate_pairs().is_empty());
}

#[test]
fn test_two_dimensional_neighbors() {
    let mut particles = registry(Dimension::Two);
    let a = particles.insert(Particle::new(SpeciesId(0), 0.5, Point3::new(0.0, 0.0, 0.0)));
    let b = particles.insert(Particle::new(SpeciesId(0), 0.5, Point3::new(0.5, 0.5, 0.0)));
    assert_eq!(particles.neighbors(a), vec![b]);
}

#[test]
fn test_candidates_cover_every_contact_over_two_decades() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut particles = registry(Dimension::Three);
    for _ in 0..400 {
        let radius = 10f64.powf(rng.gen_range(-2.0..0.0));
        let position = Point3::new(
            rng.gen_range(0.0..5.0),
            rng.gen_range(0.0..5.0),
            rng.gen_range(0.0..5.0),
        );
        particles.insert(Particle::new(SpeciesId(0), radius, position));
    }

    let candidates = particles.candidate_pairs();
    let contacts = brute_force_contacts(&particles);
    println!(
        "{} levels, {} candidates, {} contacts",
        particles.index().level_count(),
        candidates.len(),
        contacts.len()
    );

    assert!(!contacts.is_empty());
    for pair in &contacts {
        assert!(candidates.binary_search(pair).is_ok(), "missed {pair:?}");
    }
}

#[test]
fn test_query_sphere_finds_large_neighbour() {
    let mut particles = registry(Dimension::Three);
    particles.insert(Particle::new(SpeciesId(0), 0.01, Point3::new(5.0, 5.0, 5.0)));
    let big = particles.insert(Particle::new(SpeciesId(0), 1.0, Point3::new(0.0, 0.0, 0.0)));

    assert!(particles.overlaps_any(&Point3::new(1.05, 0.0, 0.0), 0.1));
    assert!(!particles.overlaps_any(&Point3::new(1.2, 0.0, 0.0), 0.1));

    let mut found = Vec::new();
    particles
        .index()
        .query_sphere(&Point3::new(1.05, 0.0, 0.0), 0.1, |id| found.push(id));
    assert!(found.contains(&big));
}
