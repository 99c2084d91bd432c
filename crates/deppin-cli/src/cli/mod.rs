//! Command-line interface definition for deppin.
//!
//! # Command Structure
//!
//! - `deppin analyze` - print the pinned dependency graph of a target
//! - `deppin build` - build the target with the build tool
//! - `deppin clean` - clean the target's build artifacts
//! - `deppin check` - report whether the target is currently built

mod commands;
pub mod enums;
mod validation;

use clap::Parser;

pub use commands::{AnalyzeArgs, Command, TargetArgs};
pub use enums::*;
pub use validation::{parse_strategy, parse_target};

/// deppin - pinned dependency graphs for import-path based projects
#[derive(Parser, Debug)]
#[command(
    name = "deppin",
    version,
    about = "Pinned dependency graphs for import-path based projects",
    long_about = "deppin traces the transitive imports of a build target with the build tool\n\
                  and pins every import to the revision recorded by the lockfile or vendor\n\
                  tree that governs it."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
