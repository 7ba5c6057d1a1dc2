use std::ptr;

use crate::barnes_hut::{
    calc_center_of_mass, calc_velocity, Particle, ParticleStore, QuadNode,
};
use crate::scheduler::{
    run_position_phase, run_simulation, run_velocity_phase, Deque, Task,
};
use crate::simulation::random_particles;

use super::worker::steal_task;

fn populated_universe(particles: Vec<Particle>) -> (ParticleStore, QuadNode) {
    let store = ParticleStore::new(particles);
    let mut root = QuadNode::universe();
    for id in 0..store.len() {
        root.insert(id, &store);
    }
    (store, root)
}

#[test]
fn test_steal_probes_victims_in_ring_order() {
    let (a, b) = (
        QuadNode::new(0.0, 1.0, 0.0, 1.0, None),
        QuadNode::new(1.0, 2.0, 0.0, 1.0, None),
    );
    let deques = vec![Deque::new(), Deque::new(), Deque::new(), Deque::new()];
    deques[2].push_front(Task { node: &a });
    deques[3].push_front(Task { node: &b });

    // Worker 0 probes 1, 2, 3 and should hit deque 2 first.
    assert!(ptr::eq(steal_task(0, &deques).unwrap().node, &a));
    assert!(ptr::eq(steal_task(0, &deques).unwrap().node, &b));
    assert!(steal_task(0, &deques).is_none());
}

#[test]
fn test_steal_never_probes_own_deque() {
    let a = QuadNode::new(0.0, 1.0, 0.0, 1.0, None);
    let deques = vec![Deque::new(), Deque::new()];
    deques[1].push_front(Task { node: &a });

    assert!(steal_task(1, &deques).is_none());
    assert_eq!(deques[1].len(), 1);
}

#[test]
fn test_velocity_phase_matches_serial_reference() {
    let particles = random_particles(100, 9);
    let dt = 0.5;

    for &threads in &[1usize, 2, 4, 8] {
        let (store, mut root) = populated_universe(particles.clone());
        calc_center_of_mass(&mut root, &store);

        // Reference: the same per-particle traversal, run serially on copies.
        let expected: Vec<Particle> = (0..store.len())
            .map(|id| {
                let mut p = store.get(id);
                calc_velocity(&mut p, id, &root, dt);
                p
            })
            .collect();

        run_velocity_phase(&root, &store, threads, dt, store.len());

        for (id, want) in expected.iter().enumerate() {
            let got = store.get(id);
            assert_eq!(got.vx.to_bits(), want.vx.to_bits(), "vx of particle {id}");
            assert_eq!(got.vy.to_bits(), want.vy.to_bits(), "vy of particle {id}");
            assert_eq!(got.fx.to_bits(), want.fx.to_bits(), "fx of particle {id}");
            assert_eq!(got.fy.to_bits(), want.fy.to_bits(), "fy of particle {id}");
            assert_eq!(got.x.to_bits(), want.x.to_bits(), "x of particle {id}");
        }
    }
}

#[test]
fn test_position_phase_advances_and_resets_every_particle() {
    let mut store = ParticleStore::new(vec![
        Particle::new(-4.0, 4.0),
        Particle::new(4.0, 4.0),
        Particle::new(0.0, -4.0),
    ]);
    for (i, p) in store.as_mut_slice().iter_mut().enumerate() {
        p.vx = i as f64 + 1.0;
        p.vy = -(i as f64);
        p.fx = 7.0;
        p.fy = -7.0;
    }

    let mut root = QuadNode::new(-8.0, 8.0, -8.0, 8.0, None);
    for id in 0..store.len() {
        root.insert(id, &store);
    }

    run_position_phase(&root, &store, 2, 0.5, store.len());

    let expected_x = [-4.0 + 0.5, 4.0 + 1.0, 0.0 + 1.5];
    let expected_y = [4.0, 4.0 - 0.5, -4.0 - 1.0];
    for id in 0..store.len() {
        let p = store.get(id);
        assert_eq!(p.x, expected_x[id]);
        assert_eq!(p.y, expected_y[id]);
        assert_eq!((p.fx, p.fy), (0.0, 0.0), "forces reset for particle {id}");
    }
}

#[test]
fn test_phases_terminate_on_empty_tree() {
    let store = ParticleStore::new(Vec::new());
    let root = QuadNode::universe();
    run_velocity_phase(&root, &store, 4, 1.0, 0);
    run_position_phase(&root, &store, 4, 1.0, 0);
}

#[test]
fn test_run_simulation_empty_tree_is_noop() {
    let store = ParticleStore::new(Vec::new());
    let mut root = QuadNode::universe();
    run_simulation(&mut root, &store, 4, 1.0, 0);
    assert_eq!(root.total_mass, 0.0);
    assert!(root.is_empty());
}

#[test]
fn test_run_simulation_single_worker() {
    let (store, mut root) = populated_universe(vec![
        Particle::new(-1.0, 0.0),
        Particle::new(1.0, 0.0),
    ]);
    run_simulation(&mut root, &store, 1, 0.01, store.len());

    let p0 = store.get(0);
    let p1 = store.get(1);
    assert!(p0.vx > 0.0 && p1.vx < 0.0);
    assert_eq!(p0.vx, -p1.vx);
    // Position phase already applied the fresh velocities and cleared forces.
    assert!(p0.x > -1.0 && p1.x < 1.0);
    assert_eq!((p0.fx, p0.fy), (0.0, 0.0));
}
