//! 2D Particle Sandbox
//!
//! Headless driver: spawns a block of particles, drops it into a box and logs
//! how the simulation evolves. Set `RUST_LOG=debug` for more detail.

use glam::Vec2;
use particle_physics::{BatchExecutor, SequentialExecutor, SimulationConfig, SpawnConfig};
use particle_simulation::{FrameStats, GpuExecutor, Simulation};
use std::collections::VecDeque;
use std::error::Error;

const PARTICLE_COUNT: u32 = particle_physics::DEFAULT_PARTICLE_COUNT;
const FRAME_DELTA: f32 = 1.0 / 60.0;
const DEFAULT_FRAMES: u64 = 600;
const REPORT_EVERY: u64 = 60;
const SUB_STEPS: u32 = 4;
const JITTER: f32 = 0.05;

/// Executor named by `PARTICLES_EXECUTOR`
fn create_executor() -> Box<dyn BatchExecutor> {
    let requested = std::env::var("PARTICLES_EXECUTOR").unwrap_or_else(|_| "parallel".into());

    match requested.to_ascii_lowercase().as_str() {
        "gpu" => match GpuExecutor::new() {
            Ok(executor) => return Box::new(executor),
            Err(e) => log::warn!("GPU executor unavailable ({}), using sequential", e),
        },
        #[cfg(feature = "parallel")]
        "parallel" => return Box::new(particle_simulation::ParallelExecutor::new()),
        "sequential" => {}
        other => log::warn!("Unknown executor '{}', using sequential", other),
    }

    Box::new(SequentialExecutor)
}

fn frame_count() -> u64 {
    match std::env::var("PARTICLES_FRAMES") {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            log::warn!("Invalid PARTICLES_FRAMES '{}', using {}", value, DEFAULT_FRAMES);
            DEFAULT_FRAMES
        }),
        Err(_) => DEFAULT_FRAMES,
    }
}

fn report(stats: &FrameStats, avg_step_ms: f32) {
    let p = &stats.particles;
    log::info!(
        "Frame {:>5}: step {:.3} ms (avg {:.3} ms), centroid ({:.2}, {:.2}), extent ({:.2}, {:.2})..({:.2}, {:.2}), mean speed {:.3}, KE {:.2}",
        stats.frame,
        stats.step_time_ms,
        avg_step_ms,
        p.centroid.x,
        p.centroid.y,
        p.min.x,
        p.min.y,
        p.max.x,
        p.max.y,
        p.mean_speed,
        p.kinetic_energy
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting 2D particle sandbox...");

    let spawn = SpawnConfig::default()
        .with_center(Vec2::new(0.0, 2.0))
        .with_jitter(JITTER);
    let config = SimulationConfig::default().with_iterations(SUB_STEPS);

    let mut simulation = Simulation::spawn(PARTICLE_COUNT, &spawn, config, create_executor())?;
    log::info!(
        "✓ {} particles, {} sub-steps per frame, executor: {}",
        simulation.particles().len(),
        config.iterations,
        simulation.executor_name()
    );

    let frames = frame_count();
    let mut step_times: VecDeque<f32> = VecDeque::with_capacity(100);

    for _ in 0..frames {
        let stats = simulation.tick(FRAME_DELTA)?;

        step_times.push_back(stats.step_time_ms);
        if step_times.len() > 100 {
            step_times.pop_front();
        }

        if stats.frame % REPORT_EVERY == 0 {
            let avg = step_times.iter().sum::<f32>() / step_times.len() as f32;
            report(&stats, avg);
        }
    }

    let snapshot = simulation.snapshot();
    let bounds = simulation.config().bounds;
    let inside = snapshot
        .positions
        .iter()
        .filter(|p| bounds.contains(**p))
        .count();
    log::info!(
        "Done after {} frames ({:.2} s simulated): {}/{} particles inside the box",
        simulation.frame(),
        simulation.elapsed(),
        inside,
        snapshot.len()
    );

    Ok(())
}
