//! Spawn and simulation parameters

use crate::constants::*;
use crate::error::{PhysicsError, Result};
use crate::integrate::SubStep;
use glam::Vec2;

/// Axis-aligned simulation box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Box described by its centre and full extents, like a 2D box collider.
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self::new(
            center.x - half.x,
            center.x + half.x,
            center.y - half.y,
            center.y + half.y,
        )
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.min_x, self.min_y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.max_x, self.max_y)
    }

    /// Inclusive containment test
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Rejects empty, inverted and NaN boxes.
    pub fn validate(&self) -> Result<()> {
        // Written as negated `<` so NaN fails too
        if !(self.min_x < self.max_x) {
            return Err(PhysicsError::invalid(format!(
                "bounds min_x ({}) must be below max_x ({})",
                self.min_x, self.max_x
            )));
        }
        if !(self.min_y < self.max_y) {
            return Err(PhysicsError::invalid(format!(
                "bounds min_y ({}) must be below max_y ({})",
                self.min_y, self.max_y
            )));
        }
        Ok(())
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(
            -BOUNDS_HALF_WIDTH,
            BOUNDS_HALF_WIDTH,
            -BOUNDS_HALF_HEIGHT,
            BOUNDS_HALF_HEIGHT,
        )
    }
}

/// Where and how particles are placed at spawn time.
///
/// Fixed once the simulation starts; the generator only reads it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnConfig {
    pub spawn_center: Vec2,
    /// Full width and height of the spawn rectangle
    pub spawn_size: Vec2,
    /// Velocity given to every particle
    pub initial_velocity: Vec2,
    /// Maximum jitter diameter around each grid cell
    pub jitter_strength: f32,
    pub seed: u64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            spawn_center: Vec2::ZERO,
            spawn_size: Vec2::splat(SPAWN_SIZE),
            initial_velocity: Vec2::ZERO,
            jitter_strength: 0.0,
            seed: SPAWN_SEED,
        }
    }
}

impl SpawnConfig {
    pub fn with_center(mut self, center: Vec2) -> Self {
        self.spawn_center = center;
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.spawn_size = size;
        self
    }

    pub fn with_initial_velocity(mut self, velocity: Vec2) -> Self {
        self.initial_velocity = velocity;
        self
    }

    pub fn with_jitter(mut self, strength: f32) -> Self {
        self.jitter_strength = strength;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let size = self.spawn_size;
        if !size.is_finite() || !(size.x > 0.0) || !(size.y > 0.0) {
            return Err(PhysicsError::invalid(format!(
                "spawn_size must be positive on both axes, got ({}, {})",
                size.x, size.y
            )));
        }
        if !self.spawn_center.is_finite() || !self.initial_velocity.is_finite() {
            return Err(PhysicsError::invalid(
                "spawn_center and initial_velocity must be finite",
            ));
        }
        if !(self.jitter_strength >= 0.0) || !self.jitter_strength.is_finite() {
            return Err(PhysicsError::invalid(format!(
                "jitter_strength must be finite and >= 0, got {}",
                self.jitter_strength
            )));
        }
        Ok(())
    }
}

/// Integration parameters, read on every step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    pub gravity: Vec2,
    /// Multiplier applied to the frame delta
    pub time_step_scale: f32,
    /// Sub-steps per frame, at least 1
    pub iterations: u32,
    /// Fraction of the normal velocity kept on a bounce, in `[0, 1]`
    pub collision_damping: f32,
    pub bounds: Bounds,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -GRAVITY),
            time_step_scale: TIME_STEP_SCALE,
            iterations: ITERATIONS,
            collision_damping: COLLISION_DAMPING,
            bounds: Bounds::default(),
        }
    }
}

impl SimulationConfig {
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_time_step_scale(mut self, scale: f32) -> Self {
        self.time_step_scale = scale;
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_collision_damping(mut self, damping: f32) -> Self {
        self.collision_damping = damping;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(PhysicsError::invalid("iterations must be at least 1"));
        }
        self.bounds.validate()?;
        if !(0.0..=1.0).contains(&self.collision_damping) {
            return Err(PhysicsError::invalid(format!(
                "collision_damping must be in [0, 1], got {}",
                self.collision_damping
            )));
        }
        if !self.time_step_scale.is_finite() || self.time_step_scale < 0.0 {
            return Err(PhysicsError::invalid(format!(
                "time_step_scale must be finite and >= 0, got {}",
                self.time_step_scale
            )));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::invalid("gravity must be finite"));
        }
        Ok(())
    }

    /// Parameters for one of the `iterations` sub-steps of a frame.
    pub fn sub_step(&self, frame_delta: f32) -> SubStep {
        SubStep {
            gravity: self.gravity,
            dt: frame_delta * self.time_step_scale / self.iterations.max(1) as f32,
            collision_damping: self.collision_damping,
            bounds: self.bounds,
        }
    }
}
