//! GPU setup and readback errors

use particle_physics::PhysicsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GpuError {
    /// No compatible adapter on this machine (common on headless CI)
    #[error("no compatible GPU adapter found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),

    #[error("failed to map GPU buffer: {0}")]
    BufferMapping(String),

    #[error("particle count {0} exceeds the GPU buffer limit")]
    TooManyParticles(usize),
}

impl From<GpuError> for PhysicsError {
    fn from(err: GpuError) -> Self {
        PhysicsError::Executor(Box::new(err))
    }
}
