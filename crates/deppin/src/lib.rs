//! # deppin
//!
//! Pinned dependency graphs for import-path based projects.
//!
//! Given a target package, `deppin` discovers its transitive imports with
//! the language's own build tool and pins every import to a revision read
//! from the lockfile (or vendor tree) that governs it.
//!
//! ## Architecture
//!
//! ```text
//!  target ──▶ Engine ──(per world)──▶ Toolchain ──▶ `go list -json`
//!               │
//!               ├──(per package)──▶ Locator ──▶ Resolver ──▶ Revision
//!               │
//!               ▼
//!        DependencyGraph
//! ```
//!
//! - [`toolchain`]: the only caller of the external build tool. Commands
//!   run through an injectable [`CommandRunner`]; [`FakeRunner`] answers
//!   from canned listings.
//! - [`resolver`]: one reader per lockfile format, answering import path
//!   to revision from an in-memory index.
//! - [`locator`]: walks up from a package to the lockfiles that govern it,
//!   under the nested, deep and external vendor policies.
//! - [`engine`]: runs the selected strategy over every build-constraint
//!   world and fuses the results.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use deppin::{FakeRunner, Module, ModuleAnalyzer};
//!
//! # async fn example() -> deppin::Result<()> {
//! let runner = FakeRunner::new()
//!     .package("example.org/app", "/src/app", &["example.org/lib", "fmt"])
//!     .package("example.org/lib", "/src/app/vendor/example.org/lib", &[]);
//!
//! let module = Module::new("/src/app", "example.org/app");
//! let analyzer = ModuleAnalyzer::with_runner(module, Arc::new(runner)).await?;
//! let graph = analyzer.analyze().await?;
//!
//! for revision in graph.dependencies_of_root() {
//!     println!("{revision}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod engine;
pub mod error;
pub mod locator;
mod module;
pub mod resolver;
pub mod toolchain;

pub use cancel::CancelSignal;
pub use engine::{Engine, worlds_for};
pub use error::{
    Error, ResolverRef, Result, UnresolvedEntry, UnresolvedReason, UnresolvedReport, WorldFailure,
};
pub use locator::{Locator, Lookup, Project, ProjectCache};
pub use module::ModuleAnalyzer;
pub use resolver::Resolver;
pub use toolchain::{
    CommandOutput, CommandRunner, FakeRunner, Invocation, Package, ProcessRunner, ToolEnv,
    Toolchain,
};

pub use deppin_config::{LockfileFormat, Module, Options, Strategy, World};
pub use deppin_graph::{DependencyGraph, ImportPath, Revision, WorldId};

#[cfg(test)]
mod tests;
