use criterion::{criterion_group, criterion_main, Criterion};
use rs_nbody::barnes_hut::{calc_center_of_mass, ParticleStore, QuadNode};
use rs_nbody::simulation::{random_particles, Simulation};

pub fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("barnes_hut");
    group.sample_size(30);

    let particles = random_particles(2_000, 42);

    group.bench_function("build_tree_2k", |b| {
        let store = ParticleStore::new(particles.clone());
        b.iter(|| {
            let mut root = QuadNode::universe();
            for id in 0..store.len() {
                root.insert(id, &store);
            }
            root
        })
    });

    group.bench_function("aggregate_2k", |b| {
        let store = ParticleStore::new(particles.clone());
        let mut root = QuadNode::universe();
        for id in 0..store.len() {
            root.insert(id, &store);
        }
        b.iter(|| {
            calc_center_of_mass(&mut root, &store);
        })
    });

    group.bench_function("step_2k_1_thread", |b| {
        let mut sim = Simulation::new(particles.clone(), 1, 1.0).unwrap();
        b.iter(|| sim.step())
    });

    group.bench_function("step_2k_4_threads", |b| {
        let mut sim = Simulation::new(particles.clone(), 4, 1.0).unwrap();
        b.iter(|| sim.step())
    });

    group.finish();
}

criterion_group!(benches, bench_simulation);
criterion_main!(benches);
