//! Host configuration.
//!
//! [`HostConfig`] is loaded in layers by [`ConfigLoader`]; see the
//! [`loader`] module for the source order.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{HostConfigError, HostConfigResult};
pub use loader::{ConfigLoader, Profile, load_config};
pub use schema::{
    EventDelivery, EventsConfig, HostConfig, LogFormat, LogLevel, LogOutput, LoggingConfig,
    PluginsConfig, SpanEventConfig,
};
