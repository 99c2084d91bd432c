//! Error handling for the deppin CLI.
//!
//! Library errors are wrapped into [`CliError`] and rendered with miette at
//! the top of `main`, adding a hint where the fix is a known flag.

mod report;

use std::path::PathBuf;
use thiserror::Error;

pub use report::cli_error_to_miette;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Analysis, toolchain and lockfile failures from the core library
    #[error(transparent)]
    Analysis(#[from] deppin::Error),

    /// Option loading and decoding failures
    #[error("Configuration error: {0}")]
    Config(#[from] deppin_config::ConfigError),

    /// `check` found the target unbuilt
    #[error("{target} is not built")]
    NotBuilt { target: String },

    /// Directory given with --dir does not exist
    #[error("Directory not found: {}", .0.display())]
    DirNotFound(PathBuf),

    /// Failed to write the graph
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;
