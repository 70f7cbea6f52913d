//! Particle storage shared between the spawner, the integrator and readers

use crate::error::{PhysicsError, Result};
use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Positions and velocities of every particle, stored as parallel arrays.
///
/// Index `i` in both arrays is the same particle. The length is fixed at
/// creation; nothing outside this crate can change it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleSet {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
}

impl ParticleSet {
    /// Empty set (zero particles is a valid simulation)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from existing arrays. Both must have the same length.
    pub fn from_parts(positions: Vec<Vec2>, velocities: Vec<Vec2>) -> Result<Self> {
        if positions.len() != velocities.len() {
            return Err(PhysicsError::invalid(format!(
                "positions ({}) and velocities ({}) differ in length",
                positions.len(),
                velocities.len()
            )));
        }
        Ok(Self {
            positions,
            velocities,
        })
    }

    pub(crate) fn with_capacity(count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(count),
            velocities: Vec::with_capacity(count),
        }
    }

    pub(crate) fn push(&mut self, position: Vec2, velocity: Vec2) {
        self.positions.push(position);
        self.velocities.push(velocity);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec2] {
        &self.velocities
    }

    /// Both arrays mutably at once, for executors.
    pub(crate) fn split_mut(&mut self) -> (&mut [Vec2], &mut [Vec2]) {
        (&mut self.positions, &mut self.velocities)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.positions
            .iter()
            .copied()
            .zip(self.velocities.iter().copied())
    }

    /// Owned copy for renderers.
    pub fn snapshot(&self) -> ParticleSnapshot {
        ParticleSnapshot {
            positions: self.positions.clone(),
            velocities: self.velocities.clone(),
        }
    }

    /// Pack into the GPU storage layout.
    pub fn to_gpu(&self) -> Vec<GpuParticle> {
        self.iter()
            .map(|(position, velocity)| GpuParticle::new(position, velocity))
            .collect()
    }

    pub fn stats(&self) -> ParticleStats {
        ParticleStats::from_set(self)
    }
}

/// Read-only copy of a [`ParticleSet`] handed to display code.
///
/// Detached from the simulation: later steps do not show up here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleSnapshot {
    pub positions: Vec<Vec2>,
    pub velocities: Vec<Vec2>,
}

impl ParticleSnapshot {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// GPU-compatible particle structure
/// Matches `Particle` in the integration shader (16 bytes, no padding)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuParticle {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
}

impl GpuParticle {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position: position.to_array(),
            velocity: velocity.to_array(),
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::from_array(self.velocity)
    }
}

/// Aggregate numbers for logging (unit mass per particle)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParticleStats {
    pub count: usize,
    pub centroid: Vec2,
    pub min: Vec2,
    pub max: Vec2,
    pub mean_speed: f32,
    pub kinetic_energy: f32,
}

impl ParticleStats {
    fn from_set(set: &ParticleSet) -> Self {
        if set.is_empty() {
            return Self::default();
        }

        let mut sum = Vec2::ZERO;
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        let mut speed_sum = 0.0;
        let mut kinetic_energy = 0.0;

        for (position, velocity) in set.iter() {
            sum += position;
            min = min.min(position);
            max = max.max(position);
            speed_sum += velocity.length();
            kinetic_energy += 0.5 * velocity.length_squared();
        }

        let n = set.len() as f32;
        Self {
            count: set.len(),
            centroid: sum / n,
            min,
            max,
            mean_speed: speed_sum / n,
            kinetic_energy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_length_mismatch() {
        let err = ParticleSet::from_parts(vec![Vec2::ZERO; 3], vec![Vec2::ZERO; 2]).unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut set =
            ParticleSet::from_parts(vec![Vec2::new(1.0, 2.0)], vec![Vec2::new(0.5, 0.0)]).unwrap();
        let snap = set.snapshot();

        set.split_mut().0[0] = Vec2::new(9.0, 9.0);

        assert_eq!(snap.positions[0], Vec2::new(1.0, 2.0));
        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn test_gpu_layout() {
        assert_eq!(std::mem::size_of::<GpuParticle>(), 16);

        let set = ParticleSet::from_parts(
            vec![Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)],
            vec![Vec2::new(-1.0, 0.0), Vec2::new(0.0, -1.0)],
        )
        .unwrap();
        let packed = set.to_gpu();
        let floats: &[f32] = bytemuck::cast_slice(&packed);
        assert_eq!(floats, &[1.0, 2.0, -1.0, 0.0, 3.0, 4.0, 0.0, -1.0]);
    }

    #[test]
    fn test_stats() {
        let set = ParticleSet::from_parts(
            vec![Vec2::new(-1.0, 0.0), Vec2::new(1.0, 2.0)],
            vec![Vec2::new(3.0, 4.0), Vec2::ZERO],
        )
        .unwrap();
        let stats = set.stats();

        assert_eq!(stats.count, 2);
        assert_eq!(stats.centroid, Vec2::new(0.0, 1.0));
        assert_eq!(stats.min, Vec2::new(-1.0, 0.0));
        assert_eq!(stats.max, Vec2::new(1.0, 2.0));
        assert_eq!(stats.mean_speed, 2.5);
        assert_eq!(stats.kinetic_energy, 12.5);
    }

    #[test]
    fn test_empty_stats() {
        assert_eq!(ParticleSet::empty().stats(), ParticleStats::default());
    }
}
