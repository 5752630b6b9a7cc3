//! Error types for plugin wiring.

use rivet_core::{BoxError, InjectionError, ServiceNotFound};
use thiserror::Error;

/// Errors raised while creating, starting or unloading plugins.
#[derive(Debug, Error)]
pub enum WiringError {
    /// A component's `#[inject]` fields could not be satisfied.
    #[error("dependency injection failed: {0}")]
    Injection(#[from] InjectionError),

    /// A service the caller required is not available in the resolved scope.
    #[error(transparent)]
    ServiceNotFound(#[from] ServiceNotFound),

    /// A plugin with this id already has a scope.
    #[error("plugin '{0}' is already loaded")]
    DuplicatePlugin(String),

    /// No loaded plugin has this id.
    #[error("plugin '{0}' is not loaded")]
    UnknownPlugin(String),

    /// A custom creation hook rejected the component.
    #[error("creation hook '{hook}' failed: {source}")]
    Hook {
        /// Name reported by the hook.
        hook: &'static str,
        #[source]
        source: BoxError,
    },

    /// A plugin's `start` or `stop` returned an error.
    #[error("plugin '{plugin}' failed to {action}: {source}")]
    Lifecycle {
        /// Id of the failing plugin.
        plugin: String,
        /// `"start"` or `"stop"`.
        action: &'static str,
        #[source]
        source: BoxError,
    },
}

/// Result type for wiring operations.
pub type WiringResult<T> = Result<T, WiringError>;
