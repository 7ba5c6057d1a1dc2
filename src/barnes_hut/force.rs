//! Gravitational force evaluation and the per-particle integration steps.

use crate::barnes_hut::particle::{Particle, ParticleId};
use crate::barnes_hut::quadtree::QuadNode;
use crate::utils::{SOFTENING, THETA};

/// Adds the point-mass contribution of `node` to the particle's accumulator.
///
/// The displacement runs from the particle towards the node's center of
/// mass, so the accumulated force is attractive. Empty cells have zero mass
/// and contribute nothing.
pub fn force_by_node(particle: &mut Particle, node: &QuadNode) {
    let dx = node.com_x - particle.x;
    let dy = node.com_y - particle.y;
    let dist_sqr = dx * dx + dy * dy + SOFTENING;
    let inv_dist = 1.0 / dist_sqr.sqrt();
    let inv_dist3 = inv_dist * inv_dist * inv_dist;
    particle.fx += dx * node.total_mass * inv_dist3;
    particle.fy += node.total_mass * dy * inv_dist3;
}

/// Accumulates the net force of `node`'s subtree onto the particle.
///
/// Leaves and sufficiently distant cells (width over distance below
/// [`THETA`]) contribute as point masses at their center of mass; everything
/// else recurses into its children. The particle's own leaf is skipped by
/// identity, so a particle exerts no force on itself.
///
/// # Examples
///
/// ```
/// use rs_nbody::barnes_hut::{
///     calc_center_of_mass, force_calculation, Particle, ParticleStore, QuadNode,
/// };
///
/// let store = ParticleStore::new(vec![Particle::new(-1.0, 0.0), Particle::new(1.0, 0.0)]);
/// let mut root = QuadNode::new(-2.0, 2.0, -2.0, 2.0, None);
/// root.insert(0, &store);
/// root.insert(1, &store);
/// calc_center_of_mass(&mut root, &store);
///
/// let mut p = store.get(0);
/// force_calculation(&mut p, 0, &root);
/// assert!(p.fx > 0.0); // pulled towards the particle on the right
/// assert_eq!(p.fy, 0.0);
/// ```
pub fn force_calculation(particle: &mut Particle, id: ParticleId, node: &QuadNode) {
    if node.particle == Some(id) {
        // Same particle.
        return;
    }

    let dx = particle.x - node.com_x;
    let dy = particle.y - node.com_y;
    let dist = (dx * dx + dy * dy + SOFTENING).sqrt();
    let s_by_d = node.width() / dist;

    if s_by_d < THETA || node.particle.is_some() {
        // Either far enough to approximate, or a leaf holding another particle.
        force_by_node(particle, node);
    } else {
        for child in [
            &node.top_left,
            &node.top_right,
            &node.bot_left,
            &node.bot_right,
        ] {
            if let Some(child) = child {
                force_calculation(particle, id, child);
            }
        }
    }
}

/// Velocity half of the timestep.
///
/// The force accumulator must be zero on entry (it is reset at the end of
/// every position update); the net force of the whole tree is accumulated
/// into it and then folded into the velocity.
pub fn calc_velocity(particle: &mut Particle, id: ParticleId, root: &QuadNode, dt: f64) {
    force_calculation(particle, id, root);
    particle.vx += dt * particle.fx;
    particle.vy += dt * particle.fy;
}

/// Position half of the timestep: advance by the just-updated velocity, then
/// clear the force accumulator for the next iteration.
pub fn update_position(particle: &mut Particle, dt: f64) {
    particle.x += particle.vx * dt;
    particle.y += particle.vy * dt;
    particle.fx = 0.0;
    particle.fy = 0.0;
}
