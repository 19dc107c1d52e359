//! Physical constants and simulation defaults.

/// Gravitational acceleration (m/s²).
pub const GRAVITY: f32 = 9.81;

/// Default simulation timestep (seconds). 1/60th of a second.
pub const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Default solver frequency (iterations per simulated second).
pub const DEFAULT_SOLVER_FREQUENCY: f32 = 300.0;

/// Upper bound on solver iterations executed for a single `step(dt)`.
pub const DEFAULT_MAX_ITERATIONS_PER_STEP: u32 = 64;

/// Default worker count for the job scheduler.
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Epsilon for floating-point comparisons.
pub const EPSILON: f32 = 1.0e-7;

/// Epsilon for degenerate triangle detection (area threshold).
pub const DEGENERATE_AREA_THRESHOLD: f32 = 1.0e-10;
