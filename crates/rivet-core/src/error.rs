//! Error types for the Rivet core.
//!
//! Listener failures inside the event bus and persistence failures inside the
//! reference persister are logged where they happen and never surface here.

use thiserror::Error;

/// Boxed error returned by event listeners and plugin lifecycle hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Returned by [`ServiceRegistryExt::require`] when nothing is registered for a
/// type, or its provider produced no value.
///
/// [`ServiceRegistryExt::require`]: crate::service::ServiceRegistryExt::require
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no service registered for type '{service}'")]
pub struct ServiceNotFound {
    /// Type name of the requested service contract.
    pub service: &'static str,
}

impl ServiceNotFound {
    /// Creates the error for service type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            service: std::any::type_name::<T>(),
        }
    }
}

/// Errors that can occur while populating `#[inject]` fields.
///
/// Fields assigned before the failing one keep their values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectionError {
    /// A required field's service is not registered.
    #[error("no service registered for type '{service}' required by field '{field}'")]
    MissingService {
        /// Name of the field being injected.
        field: &'static str,
        /// Type name of the missing service.
        service: &'static str,
    },

    /// The target refused the value for a field (unknown field or type mismatch).
    #[error("failed to inject field '{field}' of type '{service}'")]
    Assignment {
        /// Name of the field being injected.
        field: &'static str,
        /// Type name of the service that could not be assigned.
        service: &'static str,
    },
}

/// Errors raised by [`PluginConfig`] and [`ConfigService`].
///
/// [`PluginConfig`]: crate::config::PluginConfig
/// [`ConfigService`]: crate::config::ConfigService
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required argument was empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A stored value could not be parsed into the requested type.
    #[error("value '{value}' for key '{key}' is not a valid {expected}")]
    Format {
        /// The configuration key.
        key: String,
        /// The raw stored value.
        value: String,
        /// Name of the requested type.
        expected: &'static str,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
