//! Simulation driver
//!
//! The caller owns the loop: it holds a [`Simulation`] and calls
//! [`Simulation::tick`] with the frame delta of its choice. Nothing here keeps
//! a hidden per-frame callback or global state.

use glam::Vec2;
use particle_physics::{
    error::Result, generate, step_with, BatchExecutor, ParticleSet, ParticleSnapshot,
    ParticleStats, SequentialExecutor, SimulationConfig, SpawnConfig,
};
use std::time::Instant;

/// Runs the frame step on a chosen executor.
#[derive(Debug, Default)]
pub struct Integrator<E> {
    executor: E,
}

impl<E: BatchExecutor> Integrator<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Advance `particles` by one frame. See [`particle_physics::step_with`].
    pub fn step(
        &mut self,
        particles: &mut ParticleSet,
        config: &SimulationConfig,
        frame_delta: f32,
    ) -> Result<()> {
        step_with(&mut self.executor, particles, config, frame_delta)
    }
}

/// What one tick did, for logging and overlays
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    /// Wall-clock time spent in the step
    pub step_time_ms: f32,
    pub particles: ParticleStats,
}

/// Owns the particles, their configuration and the integrator.
pub struct Simulation<E = SequentialExecutor> {
    particles: ParticleSet,
    config: SimulationConfig,
    integrator: Integrator<E>,
    frame: u64,
    elapsed: f32,
}

impl<E: BatchExecutor> Simulation<E> {
    /// Validate both configurations and spawn `particle_count` particles.
    pub fn spawn(
        particle_count: u32,
        spawn: &SpawnConfig,
        config: SimulationConfig,
        executor: E,
    ) -> Result<Self> {
        config.validate()?;
        let particles = generate(particle_count, spawn)?;
        log::info!(
            "Spawned {} particles around ({:.2}, {:.2}), executor: {}",
            particles.len(),
            spawn.spawn_center.x,
            spawn.spawn_center.y,
            executor.name()
        );
        Ok(Self::from_particles(particles, config, executor))
    }

    /// Wrap an existing set. The configuration is checked on every tick.
    pub fn from_particles(particles: ParticleSet, config: SimulationConfig, executor: E) -> Self {
        Self {
            particles,
            config,
            integrator: Integrator::new(executor),
            frame: 0,
            elapsed: 0.0,
        }
    }

    /// Advance by one frame. On error nothing changes, not even the counters.
    pub fn tick(&mut self, frame_delta: f32) -> Result<FrameStats> {
        let start = Instant::now();
        self.integrator
            .step(&mut self.particles, &self.config, frame_delta)?;
        let step_time_ms = start.elapsed().as_secs_f32() * 1000.0;

        self.frame += 1;
        self.elapsed += frame_delta * self.config.time_step_scale;

        let stats = FrameStats {
            frame: self.frame,
            step_time_ms,
            particles: self.particles.stats(),
        };
        log::trace!(
            "Frame {}: {:.3} ms, centroid ({:.3}, {:.3})",
            stats.frame,
            stats.step_time_ms,
            stats.particles.centroid.x,
            stats.particles.centroid.y
        );
        Ok(stats)
    }

    /// Read-only view of the current state
    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    pub fn snapshot(&self) -> ParticleSnapshot {
        self.particles.snapshot()
    }

    pub fn positions(&self) -> &[Vec2] {
        self.particles.positions()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Replace the configuration used from the next tick on.
    pub fn set_config(&mut self, config: SimulationConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn executor_name(&self) -> &str {
        self.integrator.executor().name()
    }

    /// Ticks completed so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulated time (frame deltas times `time_step_scale`)
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// End the session and hand back the particles.
    pub fn into_particles(self) -> ParticleSet {
        self.particles
    }
}
