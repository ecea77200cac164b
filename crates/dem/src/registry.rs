//! Particle storage.
//!
//! [`ParticleRegistry`] owns every particle, real and ghost, in a generational
//! slot map and keeps the hierarchical grid in step with it. All mutation that
//! can move a particle goes through methods here so the grid never goes stale.

use nalgebra::Point3;
use slotmap::{Key, SlotMap};

use crate::config::Dimension;
use crate::hgrid::{HGrid, HGridSettings};
use crate::particle::{Particle, ParticleId};
use crate::species::SpeciesId;

fn slot_index(id: ParticleId) -> u32 {
    id.data().as_ffi() as u32
}

#[derive(Debug, Clone)]
pub struct ParticleRegistry {
    particles: SlotMap<ParticleId, Particle>,
    index: HGrid,
    /// Slots ever allocated, occupied or vacant.
    slot_count: usize,
}

impl ParticleRegistry {
    pub fn new(dimension: Dimension, settings: HGridSettings) -> Self {
        Self {
            particles: SlotMap::with_key(),
            index: HGrid::new(settings, dimension),
            slot_count: 0,
        }
    }

    /// Wraps restored storage, rebuilding the grid. `slot_count` is the
    /// value [`ParticleRegistry::slot_count`] had when it was saved.
    pub fn from_slots(
        particles: SlotMap<ParticleId, Particle>,
        slot_count: usize,
        dimension: Dimension,
        settings: HGridSettings,
    ) -> Self {
        let highest = particles
            .keys()
            .map(|id| slot_index(id) as usize)
            .max()
            .unwrap_or(0);
        let mut registry = Self {
            particles,
            index: HGrid::new(settings, dimension),
            slot_count: slot_count.max(highest),
        };
        registry.rebuild_index();
        registry
    }

    /// Raw storage, including slot generations.
    pub fn slots(&self) -> &SlotMap<ParticleId, Particle> {
        &self.particles
    }

    /// Number of slots allocated so far, including vacant ones.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn index(&self) -> &HGrid {
        &self.index
    }

    pub fn rebuild_index(&mut self) {
        self.index.rebuild(self.particles.iter());
    }

    fn allocate(&mut self, particle: Particle) -> ParticleId {
        let id = self.particles.insert(particle);
        // slot indices start at one
        self.slot_count = self.slot_count.max(slot_index(id) as usize);
        id
    }

    pub fn insert(&mut self, particle: Particle) -> ParticleId {
        let id = self.allocate(particle);
        if !self.index.insert(id, &particle) {
            self.rebuild_index();
        }
        id
    }

    pub fn remove(&mut self, id: ParticleId) -> Option<Particle> {
        self.index.remove(id);
        self.particles.remove(id)
    }

    /// Puts vacant slots back in descending index order.
    ///
    /// A deserialized slot map rebuilds its free list in that order, so
    /// doing the same after deletions makes a restarted run hand out the
    /// same ids as the run it was saved from.
    pub fn normalize_free_slots(&mut self) {
        let filler = Particle::new(SpeciesId(0), 0.0, Point3::origin());
        let vacant = self.slot_count.saturating_sub(self.particles.len());
        let mut taken: Vec<ParticleId> = (0..vacant).map(|_| self.allocate(filler)).collect();
        taken.sort_unstable_by_key(|&id| slot_index(id));
        taken.into_iter().for_each(|id| {
            self.particles.remove(id);
        });
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    /// Mutable access that does not move the particle in the grid. Use
    /// [`ParticleRegistry::modify`] for anything that changes position.
    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    /// Applies `f` to one particle and re-bins it afterwards.
    pub fn modify<R>(&mut self, id: ParticleId, f: impl FnOnce(&mut Particle) -> R) -> Option<R> {
        let particle = self.particles.get_mut(id)?;
        let result = f(particle);
        self.index.update(id, &particle.position);
        Some(result)
    }

    /// Applies `f` to every real particle and re-bins each afterwards.
    pub fn modify_real(&mut self, mut f: impl FnMut(&mut Particle)) {
        for (id, particle) in self.particles.iter_mut() {
            if particle.is_ghost() {
                continue;
            }
            f(particle);
            self.index.update(id, &particle.position);
        }
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.particles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParticleId, &Particle)> {
        self.particles.iter()
    }

    pub fn iter_real(&self) -> impl Iterator<Item = (ParticleId, &Particle)> {
        self.particles.iter().filter(|(_, p)| !p.is_ghost())
    }

    pub fn ids(&self) -> Vec<ParticleId> {
        self.particles.keys().collect()
    }

    pub fn real_ids(&self) -> Vec<ParticleId> {
        self.iter_real().map(|(id, _)| id).collect()
    }

    pub fn real_count(&self) -> usize {
        self.iter_real().count()
    }

    pub fn ghost_count(&self) -> usize {
        self.len() - self.real_count()
    }

    /// Deletes every ghost, returning how many there were.
    pub fn remove_ghosts(&mut self) -> usize {
        let ghosts: Vec<ParticleId> = self
            .particles
            .iter()
            .filter(|(_, p)| p.is_ghost())
            .map(|(id, _)| id)
            .collect();
        ghosts.iter().for_each(|&id| {
            self.remove(id);
        });
        ghosts.len()
    }

    pub fn max_interaction_radius(&self) -> f64 {
        self.particles
            .values()
            .map(|p| p.interaction_radius)
            .fold(0.0, f64::max)
    }

    pub fn zero_forces(&mut self) {
        self.particles.values_mut().for_each(|p| {
            p.force = nalgebra::Vector3::zeros();
            p.torque = nalgebra::Vector3::zeros();
        });
    }

    /// Candidate pairs from the broad phase, sorted so that evaluation order
    /// does not depend on hash iteration.
    pub fn candidate_pairs(&self) -> Vec<(ParticleId, ParticleId)> {
        let mut pairs = Vec::new();
        self.index.for_each_candidate_pair(|a, b| {
            pairs.push(if a < b { (a, b) } else { (b, a) });
        });
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Ids of particles within touching distance of `id`.
    pub fn neighbors(&self, id: ParticleId) -> Vec<ParticleId> {
        let Some(particle) = self.particles.get(id) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        self.index.query_sphere(&particle.position, particle.radius, |other| {
            if other == id {
                return;
            }
            if let Some(q) = self.particles.get(other) {
                if particle.distance_to(q) < particle.radius + q.radius {
                    found.push(other);
                }
            }
        });
        found.sort_unstable();
        found
    }

    /// True if a sphere at `position` with `radius` would overlap any
    /// particle.
    pub fn overlaps_any(&self, position: &Point3<f64>, radius: f64) -> bool {
        let mut hit = false;
        self.index.query_sphere(position, radius, |id| {
            if hit {
                return;
            }
            if let Some(p) = self.particles.get(id) {
                hit = (p.position - position).norm() < p.radius + radius;
            }
        });
        hit
    }
}
