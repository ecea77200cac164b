//! Persistent contact records.
//!
//! An [`Interaction`] outlives the ghosts that produced it. Its key names the
//! two *real* participants plus the periodic image of the second relative to
//! the first, so the same physical contact maps to the same record every
//! step: while it is seen through a ghost, after the ghost is rebuilt, and
//! after either master is folded back into the domain.
//!
//! Tangential history is stored in the frame of the first master. Contacts
//! seen through a rotated image rotate it in and out at evaluation.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::image::ImageOffset;
use crate::particle::ParticleId;
use crate::registry::ParticleRegistry;
use crate::wall::WallId;

/// The second participant of an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Partner {
    Particle(ParticleId),
    Wall(WallId),
}

/// Canonical identity of a contact.
///
/// For particle pairs `first < second`; `image` is where the second master's
/// contacting copy sits relative to the first master. Wall keys always use
/// image zero since only real particles touch walls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InteractionKey {
    pub first: ParticleId,
    pub partner: Partner,
    pub image: ImageOffset,
}

impl InteractionKey {
    /// Key for `a` touching image `image` of `b`, in canonical order.
    ///
    /// The flag is `true` when the roles were swapped, i.e. `b` is first.
    pub fn between(a: ParticleId, b: ParticleId, image: ImageOffset) -> (Self, bool) {
        if b < a {
            (
                InteractionKey {
                    first: b,
                    partner: Partner::Particle(a),
                    image: -image,
                },
                true,
            )
        } else {
            (
                InteractionKey {
                    first: a,
                    partner: Partner::Particle(b),
                    image,
                },
                false,
            )
        }
    }

    pub fn wall(particle: ParticleId, wall: WallId) -> Self {
        InteractionKey {
            first: particle,
            partner: Partner::Wall(wall),
            image: ImageOffset::ZERO,
        }
    }

    pub fn second_particle(&self) -> Option<ParticleId> {
        match self.partner {
            Partner::Particle(id) => Some(id),
            Partner::Wall(_) => None,
        }
    }

    pub fn involves(&self, id: ParticleId) -> bool {
        self.first == id || self.second_particle() == Some(id)
    }
}

/// State carried by a contact from one step to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactHistory {
    /// Accumulated tangential displacement, in the first master's frame.
    pub tangential_spring: Vector3<f64>,
    /// Time the contact has been continuously active.
    pub duration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub key: InteractionKey,
    pub last_refreshed: f64,
    pub history: ContactHistory,
    /// Most recent contact normal, first to second.
    pub normal: Vector3<f64>,
    pub overlap: f64,
    /// Force on the first participant at the last evaluation.
    pub force: Vector3<f64>,
    pub torque: Vector3<f64>,
    pub contact_point: Point3<f64>,
    pub elastic_energy: f64,
}

impl Interaction {
    pub fn new(key: InteractionKey, now: f64) -> Self {
        Interaction {
            key,
            last_refreshed: now,
            history: ContactHistory::default(),
            normal: Vector3::zeros(),
            overlap: 0.0,
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
            contact_point: Point3::origin(),
            elastic_energy: 0.0,
        }
    }

    /// Rotates every frame-dependent quantity.
    fn rotate(&mut self, rotation: &UnitQuaternion<f64>) {
        self.history.tangential_spring = rotation * self.history.tangential_spring;
        self.normal = rotation * self.normal;
        self.force = rotation * self.force;
        self.torque = rotation * self.torque;
    }
}

/// A real particle moved back into the domain by a periodic boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fold {
    pub particle: ParticleId,
    /// Image the particle now occupies relative to where it was.
    pub image: ImageOffset,
    /// Rotation applied to the particle by the fold.
    pub rotation: UnitQuaternion<f64>,
}

/// All live interactions, ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionRegistry {
    interactions: BTreeMap<InteractionKey, Interaction>,
}

impl InteractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_interactions(interactions: impl IntoIterator<Item = Interaction>) -> Self {
        Self {
            interactions: interactions.into_iter().map(|i| (i.key, i)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    pub fn get(&self, key: &InteractionKey) -> Option<&Interaction> {
        self.interactions.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interaction> {
        self.interactions.values()
    }

    /// Finds or creates the record for `key` and marks it refreshed at `now`.
    pub fn get_or_create(&mut self, key: InteractionKey, now: f64) -> &mut Interaction {
        let interaction = self
            .interactions
            .entry(key)
            .or_insert_with(|| Interaction::new(key, now));
        interaction.last_refreshed = now;
        interaction
    }

    /// Pair form of [`InteractionRegistry::get_or_create`] for real particles;
    /// argument order does not matter.
    pub fn get_or_create_pair(
        &mut self,
        a: ParticleId,
        b: ParticleId,
        now: f64,
    ) -> &mut Interaction {
        let (key, _) = InteractionKey::between(a, b, ImageOffset::ZERO);
        self.get_or_create(key, now)
    }

    /// True if the contact was already evaluated at `now`, typically through
    /// another image of the same pair.
    pub fn was_refreshed_at(&self, key: &InteractionKey, now: f64) -> bool {
        self.interactions
            .get(key)
            .is_some_and(|i| i.last_refreshed == now)
    }

    /// Drops interactions not refreshed since `cutoff`. Returns the count.
    pub fn erase_stale(&mut self, cutoff: f64) -> usize {
        let before = self.interactions.len();
        self.interactions.retain(|_, i| i.last_refreshed >= cutoff);
        before - self.interactions.len()
    }

    /// Drops interactions whose particles no longer exist.
    pub fn purge_missing(&mut self, particles: &ParticleRegistry) -> usize {
        let before = self.interactions.len();
        self.interactions.retain(|key, _| {
            particles.contains(key.first)
                && key.second_particle().map_or(true, |id| particles.contains(id))
        });
        before - self.interactions.len()
    }

    /// Re-keys interactions of folded particles so they keep their history.
    ///
    /// A fold by image `c` of the first participant shifts the relative image
    /// by `+c` and rotates the stored history with the particle; a fold of
    /// the second shifts it by `-c`. Returns the number of re-keyed records.
    pub fn reattribute(&mut self, folds: &[Fold]) -> usize {
        if folds.is_empty() {
            return 0;
        }
        let by_particle: HashMap<ParticleId, &Fold> =
            folds.iter().map(|f| (f.particle, f)).collect();

        let touched: Vec<InteractionKey> = self
            .interactions
            .keys()
            .filter(|key| {
                by_particle.contains_key(&key.first)
                    || key
                        .second_particle()
                        .is_some_and(|id| by_particle.contains_key(&id))
            })
            .copied()
            .collect();

        let mut moved: Vec<Interaction> = touched
            .iter()
            .filter_map(|key| self.interactions.remove(key))
            .collect();

        for interaction in &mut moved {
            let mut key = interaction.key;
            let is_wall = key.second_particle().is_none();

            if let Some(fold) = by_particle.get(&key.first) {
                interaction.rotate(&fold.rotation);
                if !is_wall {
                    key.image += fold.image;
                }
            }
            if let Some(fold) = key.second_particle().and_then(|id| by_particle.get(&id)) {
                key.image -= fold.image;
            }
            interaction.key = key;
        }

        // every key of a folded pair shifts alike, so re-keyed records
        // never land on one another
        let count = moved.len();
        self.interactions
            .extend(moved.into_iter().map(|interaction| (interaction.key, interaction)));
        count
    }
}
