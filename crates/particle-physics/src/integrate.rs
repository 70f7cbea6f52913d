//! Per-particle explicit Euler update and boundary response
//!
//! NOTE: Walls are resolved as a priority chain (bottom, top, left, right) and
//! at most one axis is corrected per sub-step. A particle leaving through a
//! corner therefore gets its vertical axis fixed first and its horizontal axis
//! on a later sub-step. The GPU kernel in `particle-simulation` mirrors this.

use crate::config::Bounds;
use glam::Vec2;

/// Everything one sub-step needs, shared by all particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubStep {
    pub gravity: Vec2,
    pub dt: f32,
    pub collision_damping: f32,
    pub bounds: Bounds,
}

/// Which wall a particle was pushed back from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    Bottom,
    Top,
    Left,
    Right,
}

/// Advance a single particle by one sub-step.
///
/// Velocity is updated first and the new value moves the particle
/// (semi-implicit order).
#[inline]
pub fn integrate_particle(
    sub_step: &SubStep,
    position: &mut Vec2,
    velocity: &mut Vec2,
) -> Option<Collision> {
    *velocity += sub_step.gravity * sub_step.dt;
    *position += *velocity * sub_step.dt;
    resolve_boundary(&sub_step.bounds, sub_step.collision_damping, position, velocity)
}

/// Clamp the first violated axis to the wall and reflect its velocity.
#[inline]
pub fn resolve_boundary(
    bounds: &Bounds,
    damping: f32,
    position: &mut Vec2,
    velocity: &mut Vec2,
) -> Option<Collision> {
    if position.y < bounds.min_y {
        position.y = bounds.min_y;
        velocity.y *= -damping;
        Some(Collision::Bottom)
    } else if position.y > bounds.max_y {
        position.y = bounds.max_y;
        velocity.y *= -damping;
        Some(Collision::Top)
    } else if position.x < bounds.min_x {
        position.x = bounds.min_x;
        velocity.x *= -damping;
        Some(Collision::Left)
    } else if position.x > bounds.max_x {
        position.x = bounds.max_x;
        velocity.x *= -damping;
        Some(Collision::Right)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Bounds {
        Bounds::new(-1.0, 1.0, -1.0, 1.0)
    }

    #[test]
    fn test_single_euler_update() {
        let sub = SubStep {
            gravity: Vec2::new(0.0, -9.8),
            dt: 1.0,
            collision_damping: 0.9,
            bounds: Bounds::new(-100.0, 100.0, -100.0, 100.0),
        };
        let mut pos = Vec2::new(2.0, 5.0);
        let mut vel = Vec2::ZERO;

        assert_eq!(integrate_particle(&sub, &mut pos, &mut vel), None);
        assert_eq!(vel, Vec2::new(0.0, -9.8));
        assert_eq!(pos, Vec2::new(2.0, 5.0 - 9.8));
    }

    #[test]
    fn test_bottom_bounce_damps() {
        let damping = 0.5;
        let mut pos = Vec2::new(0.0, -1.5);
        let mut vel = Vec2::new(0.3, -4.0);

        let hit = resolve_boundary(&unit_box(), damping, &mut pos, &mut vel);

        assert_eq!(hit, Some(Collision::Bottom));
        assert_eq!(pos.y, -1.0);
        assert_eq!(vel.y, 2.0);
        assert!(vel.y.abs() < 4.0);
        assert_eq!(vel.x, 0.3);
    }

    #[test]
    fn test_each_wall() {
        let cases = [
            (Vec2::new(0.0, 2.0), Vec2::new(0.0, 1.0), Collision::Top),
            (Vec2::new(-2.0, 0.0), Vec2::new(-1.0, 0.0), Collision::Left),
            (Vec2::new(2.0, 0.0), Vec2::new(1.0, 0.0), Collision::Right),
        ];
        for (mut pos, mut vel, expected) in cases {
            let hit = resolve_boundary(&unit_box(), 0.8, &mut pos, &mut vel);
            assert_eq!(hit, Some(expected));
            assert!(unit_box().contains(pos));
            assert!((vel.length() - 0.8).abs() < 1e-6);
        }
    }

    #[test]
    fn test_corner_resolves_vertical_only() {
        // Below and left of the box at once
        let mut pos = Vec2::new(-3.0, -2.0);
        let mut vel = Vec2::new(-1.0, -1.0);

        let hit = resolve_boundary(&unit_box(), 0.5, &mut pos, &mut vel);

        assert_eq!(hit, Some(Collision::Bottom));
        assert_eq!(pos, Vec2::new(-3.0, -1.0));
        assert_eq!(vel, Vec2::new(-1.0, 0.5));
    }

    #[test]
    fn test_full_damping_stops_axis() {
        let mut pos = Vec2::new(1.5, 0.0);
        let mut vel = Vec2::new(2.0, 1.0);

        resolve_boundary(&unit_box(), 0.0, &mut pos, &mut vel);

        assert_eq!(vel.x.abs(), 0.0);
        assert_eq!(vel.y, 1.0);
    }

    #[test]
    fn test_inside_untouched() {
        let mut pos = Vec2::new(0.5, -0.5);
        let mut vel = Vec2::new(1.0, 1.0);
        assert_eq!(resolve_boundary(&unit_box(), 0.5, &mut pos, &mut vel), None);
        assert_eq!(pos, Vec2::new(0.5, -0.5));
        assert_eq!(vel, Vec2::new(1.0, 1.0));
    }
}
