//! Shared fixtures for engine tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use deppin_config::Options;
use deppin_graph::ImportPath;
use tempfile::TempDir;

use crate::engine::Engine;
use crate::toolchain::{FakeRunner, Toolchain};

pub fn p(s: &str) -> ImportPath {
    ImportPath::new(s).expect("valid import path")
}

/// Write `(path, content)` pairs below the temp dir and return its root.
pub fn create_test_project(temp: &TempDir, files: &[(&str, &str)]) -> PathBuf {
    let root = temp.path().to_path_buf();
    for (path, content) in files {
        let file_path = root.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("failed to create parent of {path}: {e}"));
        }
        fs::write(&file_path, content).unwrap_or_else(|e| panic!("failed to write {path}: {e}"));
    }
    root
}

pub fn dir(root: &Path, relative: &str) -> String {
    root.join(relative).to_string_lossy().into_owned()
}

pub async fn engine(runner: Arc<FakeRunner>, module_dir: &Path, options: Options) -> Engine {
    let toolchain = Toolchain::discover("go", runner)
        .await
        .expect("fake tool is always found")
        .with_dir(module_dir.to_path_buf());
    Engine::new(toolchain, options, module_dir.to_path_buf())
}
