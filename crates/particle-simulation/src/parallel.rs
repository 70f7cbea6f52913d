//! Thread-pool executor backed by rayon

use glam::Vec2;
use particle_physics::{error::Result, integrate_particle, BatchExecutor, SubStep};
use rayon::prelude::*;

/// Runs the per-particle update on the global rayon pool.
///
/// Each particle performs exactly the same float operations as with
/// `SequentialExecutor`, so results are bit-identical.
#[derive(Debug, Clone, Copy)]
pub struct ParallelExecutor {
    /// Particles handed to a worker at a time
    min_chunk: usize,
}

impl ParallelExecutor {
    pub const DEFAULT_MIN_CHUNK: usize = 1024;

    pub fn new() -> Self {
        Self {
            min_chunk: Self::DEFAULT_MIN_CHUNK,
        }
    }

    pub fn with_min_chunk(mut self, min_chunk: usize) -> Self {
        self.min_chunk = min_chunk.max(1);
        self
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchExecutor for ParallelExecutor {
    fn name(&self) -> &str {
        "parallel"
    }

    fn execute(
        &mut self,
        sub_step: &SubStep,
        positions: &mut [Vec2],
        velocities: &mut [Vec2],
    ) -> Result<()> {
        positions
            .par_iter_mut()
            .zip(velocities.par_iter_mut())
            .with_min_len(self.min_chunk)
            .for_each(|(position, velocity)| {
                integrate_particle(sub_step, position, velocity);
            });
        Ok(())
    }
}
