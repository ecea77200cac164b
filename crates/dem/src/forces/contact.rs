//! Contact evaluation for particle pairs and particle-wall pairs.
//!
//! Either side of a pair may be a ghost. Geometry is computed from the two
//! participants as they sit in space; forces and torques are then mapped
//! back through each ghost's image transform and applied to the masters.

use nalgebra::{Point3, Vector3};

use super::ForceContext;
use crate::interaction::{InteractionKey, InteractionRegistry};
use crate::particle::ParticleId;
use crate::registry::ParticleRegistry;
use crate::species::{ContactGeometry, ContactLaw};
use crate::wall::{Wall, WallId};

/// Separation below which the centre-to-centre direction is undefined.
const COINCIDENT: f64 = 1e-300;

/// Evaluates the candidate pair `(a, b)`. Returns `true` if they touched.
///
/// Ghost-ghost pairs, pairs of two fixed particles and a particle touching
/// its own image are skipped. When several images of the same pair touch in
/// one pass, only the first one evaluated contributes.
pub fn evaluate_pair(
    particles: &mut ParticleRegistry,
    interactions: &mut InteractionRegistry,
    context: &ForceContext<'_>,
    a: ParticleId,
    b: ParticleId,
) -> bool {
    let (Some(&pa), Some(&pb)) = (particles.get(a), particles.get(b)) else {
        return false;
    };
    if (pa.is_ghost() && pb.is_ghost()) || (pa.fixed && pb.fixed) {
        return false;
    }

    let (master_a, image_a, transform_a) = pa.origin(a);
    let (master_b, image_b, transform_b) = pb.origin(b);
    if master_a == master_b {
        return false;
    }

    let (key, swapped) = InteractionKey::between(master_a, master_b, image_b - image_a);
    let (first, second, first_master, second_master, first_tr, second_tr) = if swapped {
        (pb, pa, master_b, master_a, transform_b, transform_a)
    } else {
        (pa, pb, master_a, master_b, transform_a, transform_b)
    };

    let branch = second.position - first.position;
    let distance = branch.norm();
    let overlap = first.radius + second.radius - distance;
    if !(overlap > 0.0 && overlap.is_finite()) {
        return false;
    }
    if interactions.was_refreshed_at(&key, context.time) {
        return false;
    }

    let normal = if distance > COINCIDENT {
        branch / distance
    } else {
        interactions
            .get(&key)
            .map(|i| first_tr.apply_vector(&i.normal))
            .filter(|n| n.norm_squared() > 0.0)
            .unwrap_or_else(Vector3::x)
    };

    let contact_point = first.position + normal * (first.radius - 0.5 * overlap);
    let arm_first = contact_point - first.position;
    let arm_second = contact_point - second.position;
    let relative_velocity = (first.velocity + first.angular_velocity.cross(&arm_first))
        - (second.velocity + second.angular_velocity.cross(&arm_second));

    let Some(law) = context.species.mixed(first.species, second.species) else {
        return false;
    };
    let geometry = ContactGeometry {
        overlap,
        normal,
        relative_velocity,
    };

    let interaction = interactions.get_or_create(key, context.time);
    let mut history = interaction.history;
    history.tangential_spring = first_tr.apply_vector(&history.tangential_spring);
    let response = law.evaluate(&geometry, &mut history, context.dt);
    history.tangential_spring = first_tr.unapply_vector(&history.tangential_spring);

    let force = response.force;
    let torque_first = arm_first.cross(&force);
    let torque_second = arm_second.cross(&(-force));

    interaction.history = history;
    interaction.normal = first_tr.unapply_vector(&normal);
    interaction.overlap = overlap;
    interaction.force = first_tr.unapply_vector(&force);
    interaction.torque = first_tr.unapply_vector(&torque_first);
    interaction.contact_point = first_tr.unapply_point(&contact_point);
    interaction.elastic_energy = response.elastic_energy;

    if let Some(p) = particles.get_mut(first_master) {
        p.force += first_tr.unapply_vector(&force);
        p.torque += first_tr.unapply_vector(&torque_first);
    }
    if let Some(p) = particles.get_mut(second_master) {
        p.force -= second_tr.unapply_vector(&force);
        p.torque += second_tr.unapply_vector(&torque_second);
    }
    true
}

/// Evaluates a real particle against one wall. Returns `true` on contact.
pub fn evaluate_wall(
    particles: &mut ParticleRegistry,
    interactions: &mut InteractionRegistry,
    context: &ForceContext<'_>,
    id: ParticleId,
    index: usize,
    wall: &Wall,
) -> bool {
    let Some(&particle) = particles.get(id) else {
        return false;
    };
    if particle.is_ghost() || particle.fixed {
        return false;
    }
    let Some((distance, normal)) = wall.distance_and_normal(&particle.position, particle.radius)
    else {
        return false;
    };
    let overlap = particle.radius - distance;
    if !(overlap > 0.0 && overlap.is_finite()) {
        return false;
    }
    let Some(law) = context.species.mixed(particle.species, wall.species) else {
        return false;
    };

    let contact_point: Point3<f64> = particle.position + normal * (particle.radius - 0.5 * overlap);
    let arm = contact_point - particle.position;
    let relative_velocity =
        particle.velocity + particle.angular_velocity.cross(&arm) - wall.velocity;
    let geometry = ContactGeometry {
        overlap,
        normal,
        relative_velocity,
    };

    let interaction = interactions.get_or_create(InteractionKey::wall(id, WallId(index)), context.time);
    let response = law.evaluate(&geometry, &mut interaction.history, context.dt);
    let torque = arm.cross(&response.force);

    interaction.normal = normal;
    interaction.overlap = overlap;
    interaction.force = response.force;
    interaction.torque = torque;
    interaction.contact_point = contact_point;
    interaction.elastic_energy = response.elastic_energy;

    if let Some(p) = particles.get_mut(id) {
        p.force += response.force;
        p.torque += torque;
    }
    true
}
