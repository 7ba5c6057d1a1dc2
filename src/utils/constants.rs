/// Additive term inside squared distances, keeps close encounters finite.
pub const SOFTENING: f64 = 1e-9;

/// Barnes-Hut opening threshold; a cell is treated as a point mass when
/// its width over its distance falls below this value.
pub const THETA: f64 = 0.5;

pub const DEFAULT_PARTICLE_COUNT: usize = 10_000;
pub const DEFAULT_THREAD_COUNT: usize = 1;
pub const DEFAULT_ITERATIONS: usize = 200;
pub const DEFAULT_DT: f64 = 1.0;

/// Half-width of the square the driver seeds random particles into.
pub const SEED_HALF_WIDTH: f64 = 10_000.0;
