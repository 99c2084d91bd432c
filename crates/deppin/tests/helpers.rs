//! Shared test utilities for deppin integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use deppin::{FakeRunner, ImportPath, Module, ModuleAnalyzer};
use tempfile::TempDir;

pub const TARGET: &str = "example.org/app";

pub fn p(s: &str) -> ImportPath {
    ImportPath::new(s).expect("valid import path")
}

/// A project root below a fresh temp dir, populated with `files`.
pub fn project(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("temp dir");
    let root = temp.path().join("app");
    fs::create_dir_all(&root).expect("project root");
    for (path, content) in files {
        write(&root, path, content);
    }
    (temp, root)
}

pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dir");
    }
    fs::write(&path, content).expect("fixture file");
}

/// Absolute directory of a package below `root`, as the tool reports it.
pub fn dir(root: &Path, relative: &str) -> String {
    root.join(relative).to_string_lossy().into_owned()
}

/// Analyzer for [`TARGET`] in `root` with string options.
pub async fn analyzer(
    root: &Path,
    runner: FakeRunner,
    options: &[(&str, serde_json::Value)],
) -> ModuleAnalyzer {
    let mut module = Module::new(root, TARGET);
    for (key, value) in options {
        module = module.with_option(*key, value.clone());
    }
    ModuleAnalyzer::with_runner(module, Arc::new(runner))
        .await
        .expect("analyzer")
}
