//! Batch execution of sub-steps and the frame step built on top of it

use crate::config::SimulationConfig;
use crate::error::{PhysicsError, Result};
use crate::integrate::{integrate_particle, SubStep};
use crate::particle::ParticleSet;
use glam::Vec2;

/// Runs one sub-step over every particle.
///
/// Particles within a sub-step are independent, so an implementation may
/// process them in any order or concurrently. `execute` must not return until
/// every particle has been written back.
pub trait BatchExecutor {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Whether `execute` can return an error. Fallible executors make
    /// [`step_with`] keep a backup so a failed frame can be rolled back.
    fn may_fail(&self) -> bool {
        false
    }

    fn execute(
        &mut self,
        sub_step: &SubStep,
        positions: &mut [Vec2],
        velocities: &mut [Vec2],
    ) -> Result<()>;
}

impl<E: BatchExecutor + ?Sized> BatchExecutor for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn may_fail(&self) -> bool {
        (**self).may_fail()
    }

    fn execute(
        &mut self,
        sub_step: &SubStep,
        positions: &mut [Vec2],
        velocities: &mut [Vec2],
    ) -> Result<()> {
        (**self).execute(sub_step, positions, velocities)
    }
}

/// Single-threaded reference executor
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialExecutor;

impl BatchExecutor for SequentialExecutor {
    fn name(&self) -> &str {
        "sequential"
    }

    fn execute(
        &mut self,
        sub_step: &SubStep,
        positions: &mut [Vec2],
        velocities: &mut [Vec2],
    ) -> Result<()> {
        for (position, velocity) in positions.iter_mut().zip(velocities.iter_mut()) {
            integrate_particle(sub_step, position, velocity);
        }
        Ok(())
    }
}

/// Advance `particles` by one frame on the calling thread.
pub fn step(particles: &mut ParticleSet, config: &SimulationConfig, frame_delta: f32) -> Result<()> {
    step_with(&mut SequentialExecutor, particles, config, frame_delta)
}

/// Advance `particles` by one frame, running each sub-step on `executor`.
///
/// The configuration is checked before anything is written. Sub-steps run in
/// order and each sees the full result of the previous one. If the executor
/// fails part way, the set is restored to its state before the call.
pub fn step_with<E: BatchExecutor + ?Sized>(
    executor: &mut E,
    particles: &mut ParticleSet,
    config: &SimulationConfig,
    frame_delta: f32,
) -> Result<()> {
    config.validate()?;
    if !frame_delta.is_finite() {
        return Err(PhysicsError::invalid(format!(
            "frame_delta must be finite, got {}",
            frame_delta
        )));
    }

    if particles.is_empty() {
        return Ok(());
    }

    let sub_step = config.sub_step(frame_delta);
    log::trace!(
        "Stepping {} particles: {} x dt={} on {}",
        particles.len(),
        config.iterations,
        sub_step.dt,
        executor.name()
    );

    let backup = executor.may_fail().then(|| particles.clone());

    for iteration in 0..config.iterations {
        let (positions, velocities) = particles.split_mut();
        if let Err(err) = executor.execute(&sub_step, positions, velocities) {
            log::warn!(
                "{} executor failed on sub-step {}/{}: {}",
                executor.name(),
                iteration + 1,
                config.iterations,
                err
            );
            if let Some(backup) = backup {
                *particles = backup;
            }
            return Err(err);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bounds;

    fn single(position: Vec2, velocity: Vec2) -> ParticleSet {
        ParticleSet::from_parts(vec![position], vec![velocity]).unwrap()
    }

    fn open_config() -> SimulationConfig {
        SimulationConfig::default()
            .with_bounds(Bounds::new(-1000.0, 1000.0, -1000.0, 1000.0))
            .with_time_step_scale(1.0)
    }

    #[test]
    fn test_single_iteration_matches_euler() {
        let config = open_config()
            .with_gravity(Vec2::new(0.0, -9.8))
            .with_iterations(1);
        let start = Vec2::new(1.0, 20.0);
        let mut set = single(start, Vec2::ZERO);

        step(&mut set, &config, 1.0).unwrap();

        assert_eq!(set.velocities()[0], Vec2::new(0.0, -9.8));
        assert_eq!(set.positions()[0], start + Vec2::new(0.0, -9.8));
    }

    #[test]
    fn test_gravity_applied_every_sub_step() {
        let config = open_config()
            .with_gravity(Vec2::new(0.0, -8.0))
            .with_iterations(4);
        let mut set = single(Vec2::ZERO, Vec2::ZERO);

        step(&mut set, &config, 1.0).unwrap();

        // dt = 0.25: v_k = -2k, x = sum(v_k * dt) = -0.5 * (1 + 2 + 3 + 4)
        assert_eq!(set.velocities()[0], Vec2::new(0.0, -8.0));
        assert_eq!(set.positions()[0], Vec2::new(0.0, -5.0));
    }

    #[test]
    fn test_no_op_config_is_idempotent() {
        for iterations in [1, 2, 5, 16] {
            let config = SimulationConfig::default()
                .with_gravity(Vec2::ZERO)
                .with_iterations(iterations);
            let start = Vec2::new(0.25, -0.75);
            let mut set = single(start, Vec2::ZERO);

            step(&mut set, &config, 0.016).unwrap();

            assert_eq!(set.positions()[0], start);
            assert_eq!(set.velocities()[0], Vec2::ZERO);
        }
    }

    #[test]
    fn test_invalid_config_leaves_particles_untouched() {
        let set = ParticleSet::from_parts(
            vec![Vec2::new(0.0, 1.0), Vec2::new(2.0, -3.0)],
            vec![Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
        )
        .unwrap();

        let bad = [
            SimulationConfig::default().with_iterations(0),
            SimulationConfig::default().with_bounds(Bounds::new(5.0, 5.0, -1.0, 1.0)),
            SimulationConfig::default().with_bounds(Bounds::new(6.0, 5.0, -1.0, 1.0)),
            SimulationConfig::default().with_bounds(Bounds::new(-1.0, 1.0, 1.0, -1.0)),
        ];
        for config in bad {
            let mut particles = set.clone();
            let err = step(&mut particles, &config, 0.016).unwrap_err();
            assert!(err.is_invalid_config());
            assert_eq!(particles, set);
        }
    }

    #[test]
    fn test_non_finite_frame_delta_rejected() {
        let mut set = single(Vec2::ZERO, Vec2::ZERO);
        let err = step(&mut set, &SimulationConfig::default(), f32::NAN).unwrap_err();
        assert!(err.is_invalid_config());
        assert_eq!(set.positions()[0], Vec2::ZERO);
    }

    #[test]
    fn test_empty_set_steps() {
        let mut set = ParticleSet::empty();
        step(&mut set, &SimulationConfig::default(), 0.016).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_bounce_energy_non_increasing() {
        let config = SimulationConfig::default()
            .with_bounds(Bounds::new(-1.0, 1.0, -1.0, 1.0))
            .with_gravity(Vec2::ZERO)
            .with_time_step_scale(1.0)
            .with_collision_damping(0.7);
        let before = Vec2::new(0.0, -3.0);
        let mut set = single(Vec2::new(0.0, -0.9), before);

        step(&mut set, &config, 0.1).unwrap();

        let after = set.velocities()[0];
        assert_eq!(set.positions()[0].y, -1.0);
        assert!(after.y > 0.0);
        assert!(after.y.abs() <= 0.7 * before.y.abs());
        assert!(after.y.abs() < before.y.abs());
    }

    #[test]
    fn test_corner_violation_fixes_vertical_first() {
        let config = SimulationConfig::default()
            .with_bounds(Bounds::new(-1.0, 1.0, -1.0, 1.0))
            .with_gravity(Vec2::ZERO)
            .with_time_step_scale(1.0)
            .with_collision_damping(0.5);
        let mut set = single(Vec2::new(-0.95, -0.95), Vec2::new(-1.0, -1.0));

        step(&mut set, &config, 0.1).unwrap();

        let pos = set.positions()[0];
        let vel = set.velocities()[0];
        assert_eq!(pos.y, -1.0);
        assert!(pos.x < -1.0, "x should stay outside this sub-step, got {}", pos.x);
        assert_eq!(vel.x, -1.0);
        assert_eq!(vel.y, 0.5);
    }

    #[test]
    fn test_particles_stay_in_bounds() {
        let config = SimulationConfig::default().with_iterations(4);
        let mut set = ParticleSet::from_parts(
            (0..32).map(|i| Vec2::new(i as f32 * 0.5 - 8.0, 4.0)).collect(),
            (0..32).map(|i| Vec2::new(i as f32 - 16.0, 0.0)).collect(),
        )
        .unwrap();

        for _ in 0..500 {
            step(&mut set, &config, 1.0 / 60.0).unwrap();
        }

        // The vertical walls win the priority chain, so y is always clamped
        let b = config.bounds;
        for p in set.positions() {
            assert!(p.y >= b.min_y && p.y <= b.max_y);
        }
    }

    struct FailingExecutor {
        fail_on: u32,
        calls: u32,
    }

    impl BatchExecutor for FailingExecutor {
        fn name(&self) -> &str {
            "failing"
        }

        fn may_fail(&self) -> bool {
            true
        }

        fn execute(
            &mut self,
            sub_step: &SubStep,
            positions: &mut [Vec2],
            velocities: &mut [Vec2],
        ) -> Result<()> {
            self.calls += 1;
            if self.calls == self.fail_on {
                return Err(PhysicsError::Executor("device lost".into()));
            }
            SequentialExecutor.execute(sub_step, positions, velocities)
        }
    }

    #[test]
    fn test_failed_sub_step_rolls_back() {
        let config = SimulationConfig::default().with_iterations(3);
        let original = single(Vec2::new(0.0, 2.0), Vec2::new(1.0, 0.0));
        let mut set = original.clone();
        let mut executor = FailingExecutor {
            fail_on: 2,
            calls: 0,
        };

        let err = step_with(&mut executor, &mut set, &config, 0.1).unwrap_err();

        assert!(matches!(err, PhysicsError::Executor(_)));
        assert_eq!(executor.calls, 2);
        assert_eq!(set, original);
    }
}
