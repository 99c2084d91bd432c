//! Status lines on stderr.
//!
//! Stdout is reserved for graphs, so every human-facing message goes to
//! stderr and is silenced by `--quiet`.

use console::style;
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Silence every status line except errors.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

pub fn success(message: &str) {
    if !quiet() {
        eprintln!("{} {}", style("✓").green().bold(), message);
    }
}

pub fn info(message: &str) {
    if !quiet() {
        eprintln!("{} {}", style("ℹ").blue().bold(), message);
    }
}

pub fn warning(message: &str) {
    if !quiet() {
        eprintln!("{} {}", style("⚠").yellow().bold(), style(message).yellow());
    }
}

pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
}
