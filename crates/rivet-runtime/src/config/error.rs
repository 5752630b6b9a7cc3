//! Host configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading host configuration.
#[derive(Error, Debug)]
pub enum HostConfigError {
    /// An explicitly requested file does not exist.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The file extension has no enabled format.
    #[error("Unsupported or disabled configuration file format: .{0}")]
    UnsupportedFormat(String),

    /// A source could not be parsed or did not match the schema.
    #[error("Failed to extract configuration: {0}")]
    Extract(String),
}

/// Result type for configuration operations.
pub type HostConfigResult<T> = Result<T, HostConfigError>;
