//! Error type shared by the spawn generator and the integrator

use thiserror::Error;

/// Errors raised before any particle state is touched.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// A configuration value is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A batch executor failed to run a sub-step.
    #[error("batch executor failed: {0}")]
    Executor(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PhysicsError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// True for [`PhysicsError::InvalidConfig`].
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
