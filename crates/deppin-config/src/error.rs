//! Error types for option decoding and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config value for '{field}': {hint}")]
    InvalidValue { field: String, hint: String },

    #[error("unknown strategy '{0}' (expected import-trace, import-trace:union, manifest or manifest:<format>)")]
    UnknownStrategy(String),

    #[error("unknown lockfile format '{0}'")]
    UnknownFormat(String),

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
