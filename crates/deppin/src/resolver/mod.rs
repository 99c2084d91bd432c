//! Resolver family.
//!
//! Every resolver answers one question, "which revision pins this import
//! path?", from an index built once at construction. Lookups never touch
//! the filesystem or the network.
//!
//! | Variant | Backing data | Lookup |
//! |---|---|---|
//! | [`Resolver::Lockfile`] | `Gopkg.lock`, `glide.lock`, `Godeps.json`, `vendor.json`, `vendor.conf`, `Godeps` | exact |
//! | [`Resolver::Modules`] | `go.mod` | longest module prefix |
//! | [`Resolver::VendorTree`] | `vendor/` directories (+ `modules.txt`) | exact directory |
//! | [`Resolver::Unresolved`] | unresolved allowlist | prefix, always unresolved |

mod lockfile;
mod modules;
mod unresolved;
mod vendor_tree;

pub use lockfile::LockfileResolver;
pub use modules::ModulesResolver;
pub use unresolved::UnresolvedResolver;
pub use vendor_tree::{MODULES_TXT, VendorTreeResolver};

use std::path::{Path, PathBuf};

use deppin_config::LockfileFormat;
use deppin_graph::{ImportPath, Revision};
use tracing::debug;

use crate::error::{Error, ResolverRef, Result};

/// Lockfiles above this size are rejected.
pub const MAX_LOCKFILE_BYTES: u64 = 10 * 1024 * 1024;

/// Manifest files that mark a project root without pinning anything.
pub const MANIFEST_FILES: [&str; 7] = [
    "Gopkg.toml",
    "glide.yaml",
    "go.mod",
    "Godeps/Godeps.json",
    "vendor/vendor.json",
    "vendor.conf",
    "Godeps",
];

#[derive(Debug, Clone)]
pub enum Resolver {
    Lockfile(LockfileResolver),
    Modules(ModulesResolver),
    VendorTree(VendorTreeResolver),
    Unresolved(UnresolvedResolver),
}

impl Resolver {
    /// The first lockfile format present in `dir`, in precedence order.
    pub fn detect(dir: &Path) -> Option<LockfileFormat> {
        LockfileFormat::ALL.into_iter().find(|format| {
            let candidate = dir.join(format.lockfile_name());
            match format {
                LockfileFormat::Vendor => candidate.is_dir(),
                _ => candidate.is_file(),
            }
        })
    }

    /// Format implied by a lockfile's name, for explicit overrides.
    pub fn format_of(path: &Path) -> Option<LockfileFormat> {
        LockfileFormat::ALL
            .into_iter()
            .filter(|format| *format != LockfileFormat::Vendor)
            .find(|format| path.ends_with(format.lockfile_name()))
            .or_else(|| {
                path.file_name()
                    .is_some_and(|name| name == "vendor")
                    .then_some(LockfileFormat::Vendor)
            })
    }

    /// Load the `format` lockfile governing `dir`.
    pub fn load(dir: &Path, format: LockfileFormat) -> Result<Self> {
        Self::load_file(format, &dir.join(format.lockfile_name()))
    }

    /// Load a lockfile from an explicit path.
    pub fn load_file(format: LockfileFormat, path: &Path) -> Result<Self> {
        debug!(format = %format, path = %path.display(), "loading resolver");
        let resolver = match format {
            LockfileFormat::Vendor => {
                let root = path.parent().unwrap_or(path);
                Resolver::VendorTree(VendorTreeResolver::scan(root)?)
            }
            LockfileFormat::GoModules => {
                let content = read_capped(format, path)?;
                Resolver::Modules(ModulesResolver::parse(path, &content)?)
            }
            _ => {
                let content = read_capped(format, path)?;
                Resolver::Lockfile(LockfileResolver::parse(format, path, &content)?)
            }
        };
        Ok(resolver)
    }

    /// Pinned (or explicitly unresolved) revision for `import_path`.
    pub fn resolve(&self, import_path: &ImportPath) -> Option<Revision> {
        match self {
            Resolver::Lockfile(r) => r.resolve(import_path),
            Resolver::Modules(r) => r.resolve(import_path),
            Resolver::VendorTree(r) => r.resolve(import_path),
            Resolver::Unresolved(r) => r.resolve(import_path),
        }
    }

    /// Every revision the backing file lists, sorted by name.
    pub fn entries(&self) -> Vec<Revision> {
        match self {
            Resolver::Lockfile(r) => r.entries(),
            Resolver::Modules(r) => r.entries(),
            Resolver::VendorTree(r) => r.entries(),
            Resolver::Unresolved(_) => Vec::new(),
        }
    }

    pub fn format(&self) -> Option<LockfileFormat> {
        match self {
            Resolver::Lockfile(r) => Some(r.format()),
            Resolver::Modules(_) => Some(LockfileFormat::GoModules),
            Resolver::VendorTree(_) => Some(LockfileFormat::Vendor),
            Resolver::Unresolved(_) => None,
        }
    }

    pub fn path(&self) -> PathBuf {
        match self {
            Resolver::Lockfile(r) => r.path().to_path_buf(),
            Resolver::Modules(r) => r.path().to_path_buf(),
            Resolver::VendorTree(r) => r.vendor_dir().to_path_buf(),
            Resolver::Unresolved(_) => PathBuf::new(),
        }
    }

    pub fn describe(&self) -> ResolverRef {
        ResolverRef {
            format: self.format(),
            path: self.path(),
        }
    }
}

pub(crate) fn unparseable(
    format: LockfileFormat,
    path: &Path,
    reason: impl Into<String>,
) -> Error {
    Error::LockfileUnparseable {
        format,
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Read a lockfile, refusing anything above [`MAX_LOCKFILE_BYTES`].
pub(crate) fn read_capped(format: LockfileFormat, path: &Path) -> Result<String> {
    let metadata = std::fs::metadata(path).map_err(|e| unparseable(format, path, e.to_string()))?;
    if metadata.len() > MAX_LOCKFILE_BYTES {
        return Err(unparseable(
            format,
            path,
            format!(
                "file is {} bytes, above the {MAX_LOCKFILE_BYTES} byte limit",
                metadata.len()
            ),
        ));
    }
    std::fs::read_to_string(path).map_err(|e| unparseable(format, path, e.to_string()))
}
