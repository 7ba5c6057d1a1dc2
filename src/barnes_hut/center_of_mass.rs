//! Mass aggregation over the quadtree.
//!
//! Post-order pass filling in `total_mass` and `(com_x, com_y)` for every
//! node. Children reduce in the fixed NW, NE, SW, SE order so repeated runs
//! (and the parallel variant) produce bitwise-identical sums.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::barnes_hut::particle::ParticleStore;
use crate::barnes_hut::quadtree::QuadNode;

/// Serial center-of-mass aggregation.
///
/// A leaf takes its particle's position as centroid with unit mass; an empty
/// external cell keeps zero mass. An internal node sums its present children
/// after recursing into them, skipping zero-mass cells, and falls back to a
/// `(0, 0)` centroid when the whole subtree is empty.
///
/// # Examples
///
/// ```
/// use rs_nbody::barnes_hut::{calc_center_of_mass, Particle, ParticleStore, QuadNode};
///
/// let store = ParticleStore::new(vec![
///     Particle::new(-1.0, 1.0),
///     Particle::new(1.0, 1.0),
///     Particle::new(-1.0, -1.0),
///     Particle::new(1.0, -1.0),
/// ]);
/// let mut root = QuadNode::new(-2.0, 2.0, -2.0, 2.0, None);
/// for id in 0..store.len() {
///     root.insert(id, &store);
/// }
/// calc_center_of_mass(&mut root, &store);
/// assert_eq!(root.total_mass, 4.0);
/// assert_eq!((root.com_x, root.com_y), (0.0, 0.0));
/// ```
pub fn calc_center_of_mass(node: &mut QuadNode, store: &ParticleStore) {
    if node.is_external() {
        if let Some(id) = node.particle {
            let p = store.get(id);
            node.total_mass = 1.0;
            node.com_x = p.x;
            node.com_y = p.y;
        }
        return;
    }

    let mut total_mass = 0.0;
    let mut com_x = 0.0;
    let mut com_y = 0.0;

    for child in [
        &mut node.top_left,
        &mut node.top_right,
        &mut node.bot_left,
        &mut node.bot_right,
    ] {
        if let Some(child) = child.as_deref_mut() {
            calc_center_of_mass(child, store);
            // Subdivision leaves empty sibling cells behind; they carry no mass.
            if child.total_mass > 0.0 {
                total_mass += child.total_mass;
                com_x += child.com_x * child.total_mass;
                com_y += child.com_y * child.total_mass;
            }
        }
    }

    node.total_mass = total_mass;
    if total_mass > 0.0 {
        node.com_x = com_x / total_mass;
        node.com_y = com_y / total_mass;
    } else {
        node.com_x = 0.0;
        node.com_y = 0.0;
    }
}

/// Parallel center-of-mass aggregation.
///
/// Structurally the same pass as [`calc_center_of_mass`], but each present
/// child may be handed to a scoped worker thread when the `active_threads`
/// counter sits below `num_threads`. The counter is bumped before the spawn
/// and released when the worker exits; it is admission control only, so a
/// burst of concurrent checks may briefly overshoot the cap. Past the cap
/// the recursion continues inline on the current thread.
///
/// Every spawned child is joined at the end of the scope before the parent
/// reduces, and the reduction itself runs serially in the same NW, NE, SW,
/// SE order as the serial pass, so both variants produce identical results.
pub fn calc_center_of_mass_parallel(
    node: &mut QuadNode,
    store: &ParticleStore,
    active_threads: &AtomicUsize,
    num_threads: usize,
) {
    if node.is_external() {
        if let Some(id) = node.particle {
            let p = store.get(id);
            node.total_mass = 1.0;
            node.com_x = p.x;
            node.com_y = p.y;
        }
        return;
    }

    {
        let children = [
            &mut node.top_left,
            &mut node.top_right,
            &mut node.bot_left,
            &mut node.bot_right,
        ];
        thread::scope(|s| {
            for child in children {
                if let Some(child) = child.as_deref_mut() {
                    if active_threads.load(Ordering::SeqCst) < num_threads {
                        active_threads.fetch_add(1, Ordering::SeqCst);
                        s.spawn(move || {
                            calc_center_of_mass_parallel(child, store, active_threads, num_threads);
                            active_threads.fetch_sub(1, Ordering::SeqCst);
                        });
                    } else {
                        calc_center_of_mass_parallel(child, store, active_threads, num_threads);
                    }
                }
            }
        });
        // Scope exit joined every spawned child; their fields are final.
    }

    let mut total_mass = 0.0;
    let mut com_x = 0.0;
    let mut com_y = 0.0;

    for child in [
        &node.top_left,
        &node.top_right,
        &node.bot_left,
        &node.bot_right,
    ] {
        if let Some(child) = child {
            if child.total_mass > 0.0 {
                total_mass += child.total_mass;
                com_x += child.com_x * child.total_mass;
                com_y += child.com_y * child.total_mass;
            }
        }
    }

    node.total_mass = total_mass;
    if total_mass > 0.0 {
        node.com_x = com_x / total_mass;
        node.com_y = com_y / total_mass;
    } else {
        node.com_x = 0.0;
        node.com_y = 0.0;
    }
}
