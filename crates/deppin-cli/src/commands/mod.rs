//! Command implementations for the deppin CLI.
//!
//! - [`analyze`] - print the pinned dependency graph
//! - [`lifecycle`] - `build`, `clean` and `check`

pub mod analyze;
pub mod lifecycle;
pub(crate) mod utils;

pub use analyze::execute as analyze_execute;
pub use lifecycle::{
    build as build_execute, check as check_execute, clean as clean_execute,
};
