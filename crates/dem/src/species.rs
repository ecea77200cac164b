//! Species and the contact law.
//!
//! A [`Species`] bundles a material density with the parameters of a
//! linear spring-dashpot normal law and an optional sliding-friction law.
//! Contacts between two different species use a *mixed* species held by the
//! [`SpeciesTable`], defaulting to the arithmetic mean of both parameter sets.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::interaction::ContactHistory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub usize);

/// Kinematic description of one contact, seen from the first participant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactGeometry {
    /// Penetration depth, positive while touching.
    pub overlap: f64,
    /// Unit normal pointing from the first participant to the second.
    pub normal: Vector3<f64>,
    /// Velocity of the first participant relative to the second at the
    /// contact point.
    pub relative_velocity: Vector3<f64>,
}

/// Result of evaluating a contact law.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactResponse {
    /// Force on the first participant; the second receives its negation.
    pub force: Vector3<f64>,
    /// Normal force magnitude, negative while the dashpot pulls.
    pub normal_force: f64,
    /// Energy stored in the normal and tangential springs.
    pub elastic_energy: f64,
}

/// A pairwise contact force law.
///
/// Laws may read and update the per-contact history (tangential spring)
/// but never touch particles directly; the force pass applies the returned
/// force and derives torques from the contact point.
pub trait ContactLaw {
    fn evaluate(
        &self,
        geometry: &ContactGeometry,
        history: &mut ContactHistory,
        dt: f64,
    ) -> ContactResponse;

    /// The law used between two different species.
    fn mix(&self, other: &Self) -> Self
    where
        Self: Sized;
}

/// Linear spring-dashpot normal law: `f_n = k δ + γ v_n`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearViscoelastic {
    pub stiffness: f64,
    pub dissipation: f64,
}

impl LinearViscoelastic {
    pub fn new(stiffness: f64, dissipation: f64) -> Self {
        Self {
            stiffness,
            dissipation,
        }
    }

    /// Parameters giving a prescribed collision time and restitution
    /// coefficient for a pair with the given effective mass.
    ///
    /// Restitution is clamped to `(0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dem::species::LinearViscoelastic;
    /// use approx::assert_relative_eq;
    ///
    /// let law = LinearViscoelastic::from_collision_time(0.01, 0.4, 1.0);
    /// assert_relative_eq!(law.collision_time(1.0), 0.01, epsilon = 1e-12);
    /// assert_relative_eq!(law.restitution(1.0), 0.4, epsilon = 1e-12);
    /// ```
    pub fn from_collision_time(collision_time: f64, restitution: f64, effective_mass: f64) -> Self {
        let log_r = restitution.clamp(1e-12, 1.0).ln();
        let dissipation = -2.0 * effective_mass * log_r / collision_time;
        let stiffness = effective_mass * (PI * PI + log_r * log_r) / (collision_time * collision_time);
        Self {
            stiffness,
            dissipation,
        }
    }

    /// Half-period of the damped oscillator, infinite when overdamped.
    pub fn collision_time(&self, effective_mass: f64) -> f64 {
        let damping = self.dissipation / (2.0 * effective_mass);
        let omega_sq = self.stiffness / effective_mass - damping * damping;
        if omega_sq <= 0.0 {
            f64::INFINITY
        } else {
            PI / omega_sq.sqrt()
        }
    }

    pub fn restitution(&self, effective_mass: f64) -> f64 {
        let tc = self.collision_time(effective_mass);
        if tc.is_infinite() {
            return 0.0;
        }
        (-self.dissipation / (2.0 * effective_mass) * tc).exp()
    }
}

/// Coulomb-capped tangential spring-dashpot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlidingFriction {
    pub stiffness: f64,
    pub dissipation: f64,
    pub coefficient: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub density: f64,
    pub normal: LinearViscoelastic,
    pub sliding: Option<SlidingFriction>,
}

impl Species {
    pub fn new(density: f64, normal: LinearViscoelastic) -> Self {
        Self {
            density,
            normal,
            sliding: None,
        }
    }

    /// Shorthand for a frictionless species.
    pub fn frictionless(density: f64, stiffness: f64, dissipation: f64) -> Self {
        Self::new(density, LinearViscoelastic::new(stiffness, dissipation))
    }

    pub fn with_sliding_friction(mut self, sliding: SlidingFriction) -> Self {
        self.sliding = Some(sliding);
        self
    }
}

fn mean(a: f64, b: f64) -> f64 {
    0.5 * (a + b)
}

impl ContactLaw for Species {
    fn evaluate(
        &self,
        geometry: &ContactGeometry,
        history: &mut ContactHistory,
        dt: f64,
    ) -> ContactResponse {
        let n = geometry.normal;
        let vn = geometry.relative_velocity.dot(&n);
        let normal_force = self.normal.stiffness * geometry.overlap + self.normal.dissipation * vn;

        let mut force = -normal_force * n;
        let mut elastic_energy = 0.5 * self.normal.stiffness * geometry.overlap * geometry.overlap;
        history.duration += dt;

        if let Some(sliding) = &self.sliding {
            let vt = geometry.relative_velocity - vn * n;

            // the spring lives in the current tangent plane
            let mut spring = history.tangential_spring;
            spring -= spring.dot(&n) * n;
            spring += vt * dt;

            let mut tangential = -sliding.stiffness * spring - sliding.dissipation * vt;
            let cap = sliding.coefficient * normal_force.max(0.0);
            let magnitude = tangential.norm();
            if magnitude > cap {
                tangential *= if magnitude > 0.0 { cap / magnitude } else { 0.0 };
                spring = if sliding.stiffness > 0.0 {
                    -(tangential + sliding.dissipation * vt) / sliding.stiffness
                } else {
                    Vector3::zeros()
                };
            }

            elastic_energy += 0.5 * sliding.stiffness * spring.norm_squared();
            history.tangential_spring = spring;
            force += tangential;
        }

        ContactResponse {
            force,
            normal_force,
            elastic_energy,
        }
    }

    fn mix(&self, other: &Self) -> Self {
        let sliding = match (&self.sliding, &other.sliding) {
            (Some(a), Some(b)) => Some(SlidingFriction {
                stiffness: mean(a.stiffness, b.stiffness),
                dissipation: mean(a.dissipation, b.dissipation),
                coefficient: mean(a.coefficient, b.coefficient),
            }),
            _ => None,
        };
        Species {
            density: mean(self.density, other.density),
            normal: LinearViscoelastic {
                stiffness: mean(self.normal.stiffness, other.normal.stiffness),
                dissipation: mean(self.normal.dissipation, other.normal.dissipation),
            },
            sliding,
        }
    }
}

/// All species of a run plus the symmetric table of mixed species.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesTable {
    species: Vec<Species>,
    /// Row-major `n x n`; the diagonal mirrors `species`.
    mixed: Vec<Species>,
}

impl SpeciesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a species. Mixed entries against existing species default to
    /// [`ContactLaw::mix`]; overrides made earlier are kept.
    pub fn add(&mut self, species: Species) -> SpeciesId {
        let old = self.species.len();
        self.species.push(species);
        let n = self.species.len();

        let mixed = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| {
                if i < old && j < old {
                    self.mixed[i * old + j]
                } else if i == j {
                    self.species[i]
                } else {
                    self.species[i].mix(&self.species[j])
                }
            })
            .collect();
        self.mixed = mixed;
        SpeciesId(old)
    }

    /// Overrides the law used between two species, in both orders.
    pub fn set_mixed(&mut self, a: SpeciesId, b: SpeciesId, species: Species) -> bool {
        let n = self.species.len();
        if a.0 >= n || b.0 >= n {
            return false;
        }
        self.mixed[a.0 * n + b.0] = species;
        self.mixed[b.0 * n + a.0] = species;
        true
    }

    pub fn get(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(id.0)
    }

    pub fn contains(&self, id: SpeciesId) -> bool {
        id.0 < self.species.len()
    }

    /// The law governing contacts between `a` and `b`.
    pub fn mixed(&self, a: SpeciesId, b: SpeciesId) -> Option<&Species> {
        let n = self.species.len();
        if a.0 >= n || b.0 >= n {
            return None;
        }
        self.mixed.get(a.0 * n + b.0)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpeciesId, &Species)> {
        self.species
            .iter()
            .enumerate()
            .map(|(i, s)| (SpeciesId(i), s))
    }
}
