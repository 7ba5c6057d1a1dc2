use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use rand::Rng;

use rs_nbody::simulation::{random_particles, Simulation};
use rs_nbody::utils::{
    DEFAULT_DT, DEFAULT_ITERATIONS, DEFAULT_PARTICLE_COUNT, DEFAULT_THREAD_COUNT,
};

#[derive(Parser, Debug)]
#[command(about = "Parallel Barnes-Hut n-body simulation")]
struct Args {
    /// Number of particles
    #[arg(default_value_t = DEFAULT_PARTICLE_COUNT)]
    n_particles: usize,
    /// Number of worker threads
    #[arg(default_value_t = DEFAULT_THREAD_COUNT)]
    num_threads: usize,
    /// Number of iterations
    #[arg(default_value_t = DEFAULT_ITERATIONS)]
    n_iters: usize,
    /// "y" rewrites the output snapshot after every iteration
    #[arg(default_value = "n")]
    visual: String,
    /// Timestep
    #[arg(long, default_value_t = DEFAULT_DT)]
    dt: f64,
    /// RNG seed; omit for a fresh seed each run
    #[arg(long)]
    seed: Option<u64>,
}

fn write_snapshot(sim: &Simulation, path: &str) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    sim.write_positions(&mut out)?;
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    let particles = random_particles(args.n_particles, seed);
    let mut sim = Simulation::new(particles, args.num_threads, args.dt)?;

    write_snapshot(&sim, "particles_input.dat")?;

    let visual = args.visual == "y";
    let start = Instant::now();
    for _ in 0..args.n_iters {
        sim.step();
        if visual {
            write_snapshot(&sim, "particles_output.dat")?;
        }
    }
    let elapsed = start.elapsed();

    write_snapshot(&sim, "particles_output.dat")?;
    println!("{}", elapsed.as_secs_f64());

    Ok(())
}
