//! Runtime error types.

use rivet_framework::WiringError;
use thiserror::Error;

use crate::config::HostConfigError;

/// Errors that can occur while building or running a host.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Host configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] HostConfigError),

    /// A plugin could not be wired or driven.
    #[error(transparent)]
    Wiring(#[from] WiringError),

    /// Tokio delivery was configured outside a tokio runtime.
    #[error("event delivery 'tokio' requires a running tokio runtime")]
    NoTokioRuntime,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
