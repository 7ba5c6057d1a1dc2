//! Work-stealing workers driving the velocity and position phases.
//!
//! Each phase runs a fixed pool of workers over the current tree. Worker 0
//! is seeded with the root task; everyone else starts by stealing. Workers
//! decompose a node by pushing its children onto their own deque (front, so
//! the freshest subtree stays local) and process the node's particle when it
//! is a leaf. A shared atomic counter of processed particles is the
//! termination signal: once it reaches the particle count, every idle worker
//! exits.
//!
//! The tree is read-only for the whole phase, and each particle belongs to
//! exactly one leaf, so particle writes never alias across workers. The
//! barrier between phases is the join of the thread scope.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::barnes_hut::{
    calc_center_of_mass_parallel, calc_velocity, update_position, ParticleStore, QuadNode,
};
use crate::scheduler::deque::{Deque, Task};

#[derive(Clone, Copy)]
enum Phase {
    Velocity,
    Position,
}

/// Runs one full simulation iteration over an already-built tree:
/// center-of-mass aggregation, then the velocity phase, then the position
/// phase. The tree is not rebuilt here; the caller reinserts particles at
/// their new positions afterwards.
///
/// `num_threads` must be at least 1 and `n_particles` must match the number
/// of particles reachable from `root`.
///
/// # Examples
///
/// ```
/// use rs_nbody::barnes_hut::{Particle, ParticleStore, QuadNode};
/// use rs_nbody::scheduler::run_simulation;
///
/// let store = ParticleStore::new(vec![Particle::new(-1.0, 0.0), Particle::new(1.0, 0.0)]);
/// let mut root = QuadNode::new(-2.0, 2.0, -2.0, 2.0, None);
/// root.insert(0, &store);
/// root.insert(1, &store);
///
/// run_simulation(&mut root, &store, 2, 0.01, store.len());
/// // The pair attracts: equal and opposite velocities along x.
/// assert!(store.get(0).vx > 0.0);
/// assert_eq!(store.get(0).vx, -store.get(1).vx);
/// ```
pub fn run_simulation(
    root: &mut QuadNode,
    store: &ParticleStore,
    num_threads: usize,
    dt: f64,
    n_particles: usize,
) {
    debug_assert!(num_threads > 0);

    // Positions changed last iteration, so the aggregates are stale.
    let active_threads = AtomicUsize::new(1);
    calc_center_of_mass_parallel(root, store, &active_threads, num_threads);

    run_velocity_phase(root, store, num_threads, dt, n_particles);
    run_position_phase(root, store, num_threads, dt, n_particles);
}

/// Runs the velocity phase: every particle's force is accumulated from the
/// aggregated tree and folded into its velocity, exactly once.
pub fn run_velocity_phase(
    root: &QuadNode,
    store: &ParticleStore,
    num_threads: usize,
    dt: f64,
    n_particles: usize,
) {
    run_phase(Phase::Velocity, root, store, num_threads, dt, n_particles);
}

/// Runs the position phase: every particle advances by its velocity and its
/// force accumulator is cleared, exactly once.
pub fn run_position_phase(
    root: &QuadNode,
    store: &ParticleStore,
    num_threads: usize,
    dt: f64,
    n_particles: usize,
) {
    run_phase(Phase::Position, root, store, num_threads, dt, n_particles);
}

fn run_phase(
    phase: Phase,
    root: &QuadNode,
    store: &ParticleStore,
    num_threads: usize,
    dt: f64,
    n_particles: usize,
) {
    let deques: Vec<Deque<'_>> = (0..num_threads).map(|_| Deque::new()).collect();
    deques[0].push_front(Task { node: root });
    let processed = AtomicUsize::new(0);

    thread::scope(|s| {
        for me in 0..num_threads {
            let deques = &deques;
            let processed = &processed;
            s.spawn(move || worker(phase, root, store, dt, me, deques, processed, n_particles));
        }
    });
}

#[allow(clippy::too_many_arguments)]
fn worker<'t>(
    phase: Phase,
    root: &'t QuadNode,
    store: &ParticleStore,
    dt: f64,
    me: usize,
    deques: &[Deque<'t>],
    processed: &AtomicUsize,
    n_particles: usize,
) {
    loop {
        let task = match deques[me].pop_front() {
            Some(task) => Some(task),
            // Own deque is empty, try the other workers.
            None => steal_task(me, deques),
        };

        match task {
            Some(task) => process_subtree(phase, root, task.node, store, dt, me, deques, processed),
            None => {
                if processed.load(Ordering::SeqCst) >= n_particles {
                    return;
                }
                // Nothing to do yet; back off briefly before re-checking.
                std::hint::spin_loop();
                thread::yield_now();
            }
        }
    }
}

/// Tries each victim `(me + i) mod T` in turn, taking from the back of the
/// first non-empty deque.
pub(crate) fn steal_task<'t>(me: usize, deques: &[Deque<'t>]) -> Option<Task<'t>> {
    let n = deques.len();
    for i in 1..n {
        let victim = (me + i) % n;
        if let Some(task) = deques[victim].pop_back() {
            return Some(task);
        }
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn process_subtree<'t>(
    phase: Phase,
    root: &'t QuadNode,
    node: &'t QuadNode,
    store: &ParticleStore,
    dt: f64,
    me: usize,
    deques: &[Deque<'t>],
    processed: &AtomicUsize,
) {
    for child in [
        node.top_left.as_deref(),
        node.top_right.as_deref(),
        node.bot_left.as_deref(),
        node.bot_right.as_deref(),
    ] {
        if let Some(child) = child {
            deques[me].push_front(Task { node: child });
        }
    }

    if let Some(id) = node.particle {
        // Each particle lives in exactly one leaf, so this worker is the only
        // writer of `id` during the phase.
        let particle = unsafe { store.get_mut(id) };
        match phase {
            Phase::Velocity => calc_velocity(particle, id, root, dt),
            Phase::Position => update_position(particle, dt),
        }
        processed.fetch_add(1, Ordering::SeqCst);
    }
}
