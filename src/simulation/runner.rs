//! Iteration driver: owns the particle pool and the current tree, advances
//! the system one timestep at a time, and writes position snapshots.

use std::io;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::barnes_hut::{recreate_with_new_pos, Particle, ParticleStore, QuadNode};
use crate::errors::SimulationError;
use crate::scheduler::run_simulation;
use crate::utils::SEED_HALF_WIDTH;

/// A complete Barnes-Hut n-body simulation.
///
/// The particle pool is allocated once and lives for the whole run; the
/// quadtree indexes into it and is rebuilt from scratch after every
/// iteration, since the position phase invalidates the spatial partition.
///
/// # Examples
///
/// ```
/// use rs_nbody::barnes_hut::Particle;
/// use rs_nbody::simulation::Simulation;
///
/// let particles = vec![Particle::new(-1.0, 0.0), Particle::new(1.0, 0.0)];
/// let mut sim = Simulation::new(particles, 2, 0.01).expect("valid configuration");
/// sim.run(2);
///
/// let positions = sim.positions();
/// assert_eq!(positions.len(), 2);
/// ```
#[derive(Debug)]
pub struct Simulation {
    store: ParticleStore,
    root: QuadNode,
    num_threads: usize,
    dt: f64,
}

impl Simulation {
    /// Creates a simulation over the given particles.
    ///
    /// Builds the initial universe-spanning tree. Velocities and force
    /// accumulators of the supplied particles are expected to be zero for a
    /// cold start, but pre-seeded velocities are honored.
    ///
    /// # Errors
    ///
    /// Returns an error if `num_threads` is zero, `dt` is not positive and
    /// finite, or any particle position is non-finite.
    pub fn new(
        particles: Vec<Particle>,
        num_threads: usize,
        dt: f64,
    ) -> Result<Self, SimulationError> {
        if num_threads == 0 {
            return Err(SimulationError::InvalidThreadCount);
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimulationError::InvalidTimestep);
        }
        if particles
            .iter()
            .any(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(SimulationError::NonFinitePosition);
        }

        let store = ParticleStore::new(particles);
        let mut root = QuadNode::universe();
        for id in 0..store.len() {
            root.insert(id, &store);
        }
        debug!(
            "simulation ready: {} particles, {} worker threads, dt {}",
            store.len(),
            num_threads,
            dt
        );

        Ok(Simulation {
            store,
            root,
            num_threads,
            dt,
        })
    }

    pub fn num_particles(&self) -> usize {
        self.store.len()
    }

    /// The current tree; aggregates are only fresh during an iteration.
    pub fn root(&self) -> &QuadNode {
        &self.root
    }

    /// Advances the system by one timestep.
    ///
    /// Aggregates the tree, runs the velocity and position phases, then
    /// rebuilds the tree around the new positions. The old tree is dropped
    /// wholesale; particle identities survive the rebuild.
    pub fn step(&mut self) {
        run_simulation(
            &mut self.root,
            &self.store,
            self.num_threads,
            self.dt,
            self.store.len(),
        );

        let mut new_root = QuadNode::universe();
        recreate_with_new_pos(&self.root, &mut new_root, &self.store);
        self.root = new_root;
    }

    /// Runs `iterations` timesteps.
    pub fn run(&mut self, iterations: usize) {
        for _ in 0..iterations {
            self.step();
        }
        debug!("completed {} iterations", iterations);
    }

    /// Current particle states in the tree's leaf-traversal order.
    pub fn particles(&self) -> Vec<Particle> {
        let mut particles = Vec::with_capacity(self.store.len());
        self.root
            .for_each_particle(&mut |id| particles.push(self.store.get(id)));
        particles
    }

    /// Current positions in the tree's leaf-traversal order.
    pub fn positions(&self) -> Vec<(f64, f64)> {
        self.particles().iter().map(|p| (p.x, p.y)).collect()
    }

    /// Writes one `"x y"` line per particle, six decimal places, in the
    /// tree's leaf-traversal order.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_nbody::barnes_hut::Particle;
    /// use rs_nbody::simulation::Simulation;
    ///
    /// let sim = Simulation::new(vec![Particle::new(1.5, -2.0)], 1, 1.0).unwrap();
    /// let mut out = Vec::new();
    /// sim.write_positions(&mut out).unwrap();
    /// assert_eq!(String::from_utf8(out).unwrap(), "1.500000 -2.000000\n");
    /// ```
    pub fn write_positions<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let mut result = Ok(());
        self.root.for_each_particle(&mut |id| {
            if result.is_ok() {
                let p = self.store.get(id);
                result = writeln!(out, "{:.6} {:.6}", p.x, p.y);
            }
        });
        result
    }
}

/// Seeds `n` particles uniformly over the square
/// `[-SEED_HALF_WIDTH, +SEED_HALF_WIDTH)²`, at rest.
///
/// The same seed always yields the same particles, which together with the
/// deterministic reduction order makes whole runs reproducible.
///
/// # Examples
///
/// ```
/// use rs_nbody::simulation::random_particles;
///
/// let a = random_particles(32, 7);
/// let b = random_particles(32, 7);
/// assert_eq!(a, b);
/// ```
pub fn random_particles(n: usize, seed: u64) -> Vec<Particle> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Particle::new(
                rng.random_range(-SEED_HALF_WIDTH..SEED_HALF_WIDTH),
                rng.random_range(-SEED_HALF_WIDTH..SEED_HALF_WIDTH),
            )
        })
        .collect()
}
