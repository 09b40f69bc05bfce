//! Common error types for the forensics services

use thiserror::Error;

/// Common result type for forensics operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the forensics services
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML configuration file could not be parsed
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Request rejected at the service boundary
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
