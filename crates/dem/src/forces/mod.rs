//! Force computation.
//!
//! A force pass zeroes every accumulator, applies body forces to real
//! movable particles, then evaluates contacts: candidate pairs from the grid
//! in sorted order, followed by particle-wall contacts.

use nalgebra::Vector3;

use crate::interaction::InteractionRegistry;
use crate::particle::Particle;
use crate::registry::ParticleRegistry;
use crate::species::SpeciesTable;
use crate::wall::Wall;

pub mod contact;
pub mod gravity;

#[cfg(test)]
mod gravity_test;

pub use contact::{evaluate_pair, evaluate_wall};
pub use gravity::UniformGravity;

/// A force acting on each particle independently of the others.
pub trait BodyForce: Send + Sync {
    /// Force on a single particle.
    fn force(&self, particle: &Particle) -> Vector3<f64>;

    /// Potential energy of a single particle. Defaults to zero.
    fn potential_energy(&self, _particle: &Particle) -> f64 {
        0.0
    }
}

/// Counters from one force pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForceStats {
    pub pairs_tested: usize,
    pub particle_contacts: usize,
    pub wall_contacts: usize,
}

/// Everything a force pass reads besides the particles themselves.
pub struct ForceContext<'a> {
    pub species: &'a SpeciesTable,
    pub walls: &'a [Wall],
    pub body_force: &'a dyn BodyForce,
    pub time: f64,
    pub dt: f64,
}

/// Recomputes all forces and torques.
pub fn compute_forces(
    particles: &mut ParticleRegistry,
    interactions: &mut InteractionRegistry,
    context: &ForceContext<'_>,
) -> ForceStats {
    particles.zero_forces();
    particles.modify_real(|p| {
        if !p.fixed {
            p.force += context.body_force.force(p);
        }
    });

    let mut stats = ForceStats::default();
    for (a, b) in particles.candidate_pairs() {
        stats.pairs_tested += 1;
        if evaluate_pair(particles, interactions, context, a, b) {
            stats.particle_contacts += 1;
        }
    }

    for id in particles.real_ids() {
        for (index, wall) in context.walls.iter().enumerate() {
            if evaluate_wall(particles, interactions, context, id, index, wall) {
                stats.wall_contacts += 1;
            }
        }
    }
    stats
}
