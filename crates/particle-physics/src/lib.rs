//! # Particle Physics
//!
//! Core of the 2D particle sandbox: a deterministic grid spawner, an explicit
//! Euler integrator with damped wall bounces, and the [`BatchExecutor`]
//! abstraction that lets the per-particle update run sequentially, on a thread
//! pool or on the GPU.

pub mod config;
pub mod constants;
pub mod error;
pub mod executor;
pub mod integrate;
pub mod particle;
pub mod spawn;

pub use config::*;
pub use constants::*;
pub use error::PhysicsError;
pub use executor::*;
pub use integrate::*;
pub use particle::*;
pub use spawn::*;
