//! Project-root discovery.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use deppin_config::LockfileFormat;
use deppin_graph::ImportPath;
use once_cell::sync::OnceCell;
use path_clean::PathClean;
use tracing::{debug, warn};

use crate::resolver::{MANIFEST_FILES, ModulesResolver, Resolver, read_capped};
use crate::toolchain::is_search_root;

/// The project that owns the analysis target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub root: PathBuf,
    /// Import path of `root`. Packages below it are first-party.
    pub import_path: ImportPath,
    /// Lockfile detected at `root`, in precedence order.
    pub lockfile: Option<LockfileFormat>,
    /// First manifest file found at `root`.
    pub manifest: Option<PathBuf>,
}

impl Project {
    /// Describe `root` as the project for `target`, whose sources live in
    /// `target_dir`.
    pub fn at(root: &Path, target: &ImportPath, target_dir: &Path) -> Self {
        let root = root.to_path_buf().clean();
        let lockfile = Resolver::detect(&root);
        Self::with_lockfile(root, lockfile, target, target_dir)
    }

    /// Like [`at`](Self::at), for a root whose lockfile was already detected.
    fn with_lockfile(
        root: PathBuf,
        lockfile: Option<LockfileFormat>,
        target: &ImportPath,
        target_dir: &Path,
    ) -> Self {
        let manifest = MANIFEST_FILES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file());
        let import_path = module_path(&root)
            .or_else(|| strip_dir_suffix(target, &root, target_dir))
            .unwrap_or_else(|| target.clone());

        Self {
            root,
            import_path,
            lockfile,
            manifest,
        }
    }

    /// Whether `import_path` belongs to this project and is not vendored.
    pub fn is_first_party(&self, import_path: &ImportPath) -> bool {
        !import_path.is_vendored() && self.import_path.is_prefix_of(import_path)
    }
}

/// The lockfile detected in `dir`, when `dir` holds a lockfile or a
/// manifest file.
fn marks_project(dir: &Path) -> Option<Option<LockfileFormat>> {
    let lockfile = Resolver::detect(dir);
    let marked = lockfile.is_some() || MANIFEST_FILES.iter().any(|name| dir.join(name).is_file());
    marked.then_some(lockfile)
}

/// The `module` line of `<root>/go.mod`, if readable.
fn module_path(root: &Path) -> Option<ImportPath> {
    let path = root.join(LockfileFormat::GoModules.lockfile_name());
    if !path.is_file() {
        return None;
    }
    let content = read_capped(LockfileFormat::GoModules, &path).ok()?;
    ModulesResolver::parse(&path, &content)
        .ok()?
        .module()
        .cloned()
}

/// `example.org/app/cmd/tool` in `<root>/cmd/tool` lives in project
/// `example.org/app`.
fn strip_dir_suffix(target: &ImportPath, root: &Path, target_dir: &Path) -> Option<ImportPath> {
    let relative = target_dir.clean();
    let relative = relative.strip_prefix(root).ok()?;
    let suffix = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if suffix.is_empty() {
        return Some(target.clone());
    }
    let base = target.as_str().strip_suffix(suffix.as_str())?;
    ImportPath::new(base.strip_suffix('/')?).ok()
}

/// Memoized upward search for project roots.
#[derive(Debug, Default)]
pub struct ProjectCache {
    search_roots: Vec<PathBuf>,
    projects: DashMap<PathBuf, Arc<OnceCell<Project>>>,
}

impl ProjectCache {
    pub fn new(search_roots: Vec<PathBuf>) -> Self {
        Self {
            search_roots,
            projects: DashMap::new(),
        }
    }

    /// Project owning `target`, found by walking up from `target_dir` to
    /// the first directory holding a lockfile or manifest.
    ///
    /// Falls back to `target_dir` itself when nothing is found.
    pub fn discover(&self, target: &ImportPath, target_dir: &Path) -> Project {
        let key = target_dir.to_path_buf().clean();
        let cell = self.projects.entry(key.clone()).or_default().clone();
        cell.get_or_init(|| {
            let root = key
                .ancestors()
                .take_while(|dir| !is_search_root(&self.search_roots, dir))
                .find_map(|dir| marks_project(dir).map(|lockfile| (dir, lockfile)));

            match root {
                Some((root, lockfile)) => {
                    let project =
                        Project::with_lockfile(root.to_path_buf(), lockfile, target, &key);
                    debug!(
                        root = %project.root.display(),
                        import_path = %project.import_path,
                        "found project"
                    );
                    project
                }
                None => {
                    warn!(
                        target = %target,
                        dir = %key.display(),
                        "no lockfile or manifest above the target; using its directory as project root"
                    );
                    // The walk only skipped `key` if it is a search root.
                    let lockfile = is_search_root(&self.search_roots, &key)
                        .then(|| Resolver::detect(&key))
                        .flatten();
                    Project::with_lockfile(key.clone(), lockfile, target, &key)
                }
            }
        })
        .clone()
    }
}
