//! # Particle Simulation Engine
//!
//! Drives the particle sandbox frame by frame. Provides the [`Simulation`]
//! driver plus batch executors beyond the sequential reference: a rayon
//! thread pool and a wgpu compute shader.

pub mod error;
pub mod gpu;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod params;
pub mod simulation;

pub use error::*;
pub use gpu::*;
#[cfg(feature = "parallel")]
pub use parallel::*;
pub use params::*;
pub use simulation::*;
