//! Deterministic spawn generator
//!
//! Particles are laid out row by row on a grid whose shape follows the spawn
//! rectangle, then nudged along a random direction. The random generator is
//! created per call from the seed, so results never depend on what else the
//! program has drawn.

use crate::config::SpawnConfig;
use crate::error::Result;
use crate::particle::ParticleSet;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Column and row count of the spawn grid.
///
/// The grid holds at least `count` cells and roughly matches the aspect ratio
/// of `size`. Always at least one column.
pub fn grid_dimensions(count: u32, size: Vec2) -> (u32, u32) {
    if count == 0 {
        return (0, 0);
    }

    let n = count as f32;
    let diff = size.x - size.y;
    let aspect = size.x / size.y;

    let num_x = ((aspect * n + diff * diff / (4.0 * size.y * size.y)).sqrt()
        - diff / (2.0 * size.y))
        .ceil()
        .max(1.0) as u32;
    let num_y = count.div_ceil(num_x);

    (num_x, num_y)
}

/// Generate `particle_count` particles from `config`.
///
/// Two calls with the same arguments return identical sets. Per particle the
/// generator draws the jitter angle first, then the jitter scale.
pub fn generate(particle_count: u32, config: &SpawnConfig) -> Result<ParticleSet> {
    config.validate()?;

    if particle_count == 0 {
        log::debug!("Spawn requested with zero particles");
        return Ok(ParticleSet::empty());
    }

    let (num_x, num_y) = grid_dimensions(particle_count, config.spawn_size);
    log::debug!(
        "Spawning {} particles on a {}x{} grid (seed {})",
        particle_count,
        num_x,
        num_y,
        config.seed
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut particles = ParticleSet::with_capacity(particle_count as usize);
    let size = config.spawn_size;

    'rows: for y in 0..num_y {
        for x in 0..num_x {
            if particles.len() >= particle_count as usize {
                break 'rows;
            }

            let tx = grid_coordinate(x, num_x);
            let ty = grid_coordinate(y, num_y);
            let base = config.spawn_center + Vec2::new((tx - 0.5) * size.x, (ty - 0.5) * size.y);

            let angle = rng.random::<f32>() * TAU;
            let dir = Vec2::new(angle.cos(), angle.sin());
            let jitter = (rng.random::<f32>() - 0.5) * config.jitter_strength * dir;

            particles.push(base + jitter, config.initial_velocity);
        }
    }

    Ok(particles)
}

/// Normalized position of cell `i` along an axis with `n` cells.
fn grid_coordinate(i: u32, n: u32) -> f32 {
    if n <= 1 {
        0.5
    } else {
        i as f32 / (n - 1) as f32
    }
}
