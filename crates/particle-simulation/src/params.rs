//! Sub-step parameters in the GPU uniform layout

use bytemuck::{Pod, Zeroable};
use particle_physics::SubStep;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SubStepParams {
    // Group 1: Integration
    // xy: gravity, z: dt, w: collision_damping
    pub integration: [f32; 4],

    // Group 2: Bounds
    // x: min_x, y: max_x, z: min_y, w: max_y
    pub bounds: [f32; 4],

    // Group 3: Dispatch
    // x: particle_count, yzw: padding
    pub dispatch: [u32; 4],
}

impl SubStepParams {
    pub fn new(sub_step: &SubStep, particle_count: u32) -> Self {
        let b = sub_step.bounds;
        Self {
            integration: [
                sub_step.gravity.x,
                sub_step.gravity.y,
                sub_step.dt,
                sub_step.collision_damping,
            ],
            bounds: [b.min_x, b.max_x, b.min_y, b.max_y],
            dispatch: [particle_count, 0, 0, 0],
        }
    }
}
