//! deppin CLI.
//!
//! The command-line face of [`deppin`]: it turns flags, `deppin.toml` and
//! `DEPPIN_*` environment variables into a module record, runs the analyzer
//! and prints the resulting graph.
//!
//! # Architecture
//!
//! - [`cli`] - clap argument definitions
//! - [`commands`] - `analyze`, `build`, `clean` and `check`
//! - [`error`] - CLI errors and their miette rendering
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status lines on stderr

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result};
