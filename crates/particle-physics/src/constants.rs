//! Default scene constants for the particle sandbox
//!
//! These describe the reference scene: a small square block of particles
//! dropped into a wide, short box.

/// Number of particles spawned by default
pub const DEFAULT_PARTICLE_COUNT: u32 = 256;

/// Downward gravitational acceleration (simulation units / s²)
pub const GRAVITY: f32 = 10.0;

/// Multiplier applied to every frame delta
pub const TIME_STEP_SCALE: f32 = 2.0;

/// Fraction of the normal velocity kept after a wall bounce
pub const COLLISION_DAMPING: f32 = 0.9;

/// Sub-steps per frame
pub const ITERATIONS: u32 = 1;

/// Width and height of the square spawn region
pub const SPAWN_SIZE: f32 = 4.0;

/// Seed used by the spawn generator when none is given
pub const SPAWN_SEED: u64 = 42;

/// Half-width of the simulation box
pub const BOUNDS_HALF_WIDTH: f32 = 10.0;

/// Half-height of the simulation box
pub const BOUNDS_HALF_HEIGHT: f32 = 5.0;
