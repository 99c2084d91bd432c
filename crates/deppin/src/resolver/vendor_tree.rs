//! Vendor-tree resolver: the `vendor/` directory is the lockfile.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use deppin_config::LockfileFormat;
use deppin_graph::{ImportPath, Revision, is_path_prefix};
use tracing::debug;
use walkdir::WalkDir;

use super::{read_capped, unparseable};
use crate::error::Result;

/// Metadata file that records module versions for a vendor tree.
pub const MODULES_TXT: &str = "modules.txt";

#[derive(Debug, Clone)]
pub struct VendorTreeResolver {
    vendor_dir: PathBuf,
    /// Every directory below `vendor/`, as an import path.
    directories: BTreeSet<ImportPath>,
    /// Directories holding at least one source file.
    packages: BTreeSet<ImportPath>,
    /// Module path to version, from `modules.txt`.
    modules: BTreeMap<ImportPath, String>,
}

impl VendorTreeResolver {
    /// Index `<root>/vendor` once. Nested vendor directories are not
    /// descended into; they belong to their own resolver.
    pub fn scan(root: &Path) -> Result<Self> {
        let vendor_dir = root.join("vendor");
        let mut directories = BTreeSet::new();
        let mut packages = BTreeSet::new();

        let walker = WalkDir::new(&vendor_dir)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                entry.depth() == 0
                    || !(entry.file_type().is_dir()
                        && (name == "vendor"
                            || name == "testdata"
                            || name.starts_with('.')
                            || name.starts_with('_')))
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                unparseable(LockfileFormat::Vendor, &vendor_dir, e.to_string())
            })?;
            let Ok(relative) = entry.path().strip_prefix(&vendor_dir) else {
                continue;
            };

            if entry.file_type().is_dir() {
                if let Some(import_path) = to_import_path(relative) {
                    directories.insert(import_path);
                }
            } else if entry.path().extension().is_some_and(|ext| ext == "go") {
                if let Some(import_path) = relative.parent().and_then(to_import_path) {
                    packages.insert(import_path);
                }
            }
        }

        let modules_txt = vendor_dir.join(MODULES_TXT);
        let modules = if modules_txt.is_file() {
            let content = read_capped(LockfileFormat::Vendor, &modules_txt)?;
            parse_modules_txt(&content)
                .map_err(|reason| unparseable(LockfileFormat::Vendor, &modules_txt, reason))?
        } else {
            BTreeMap::new()
        };

        debug!(
            vendor = %vendor_dir.display(),
            directories = directories.len(),
            modules = modules.len(),
            "indexed vendor tree"
        );

        Ok(Self {
            vendor_dir,
            directories,
            packages,
            modules,
        })
    }

    pub fn vendor_dir(&self) -> &Path {
        &self.vendor_dir
    }

    /// An import path resolves iff its directory exists under `vendor/`.
    /// Without module metadata the revision is unresolved.
    pub fn resolve(&self, import_path: &ImportPath) -> Option<Revision> {
        if !self.directories.contains(import_path) {
            return None;
        }
        Some(match self.module_version(import_path) {
            Some(version) => Revision::pinned(import_path.clone(), version),
            None => Revision::unresolved(import_path.clone()),
        })
    }

    fn module_version(&self, import_path: &ImportPath) -> Option<&str> {
        self.modules
            .iter()
            .filter(|(module, _)| is_path_prefix(module.as_str(), import_path.as_str()))
            .max_by(|(a, _), (b, _)| {
                a.as_str()
                    .len()
                    .cmp(&b.as_str().len())
                    .then_with(|| b.cmp(a))
            })
            .map(|(_, version)| version.as_str())
    }

    /// Modules when metadata exists, otherwise every vendored package.
    pub fn entries(&self) -> Vec<Revision> {
        if !self.modules.is_empty() {
            return self
                .modules
                .iter()
                .map(|(module, version)| Revision::pinned(module.clone(), version.clone()))
                .collect();
        }
        self.packages
            .iter()
            .map(|package| Revision::unresolved(package.clone()))
            .collect()
    }
}

fn to_import_path(relative: &Path) -> Option<ImportPath> {
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    ImportPath::new(joined).ok()
}

/// `# module version [=> replacement [version]]` headers; package lines
/// and `##` annotations are ignored.
fn parse_modules_txt(
    content: &str,
) -> std::result::Result<BTreeMap<ImportPath, String>, String> {
    let mut modules = BTreeMap::new();
    for (number, line) in content.lines().enumerate() {
        let Some(header) = line.strip_prefix("# ") else {
            continue;
        };
        let (source, replacement) = match header.split_once("=>") {
            Some((source, replacement)) => (source, Some(replacement)),
            None => (header, None),
        };

        let mut fields = source.split_whitespace();
        let Some(module) = fields.next() else {
            return Err(format!("line {}: empty module header", number + 1));
        };
        let mut version = fields.next().unwrap_or_default().to_string();
        if let Some(replacement) = replacement {
            let fields: Vec<&str> = replacement.split_whitespace().collect();
            if let [_, replacement_version] = fields.as_slice() {
                version = replacement_version.to_string();
            }
        }
        if version.is_empty() {
            continue;
        }

        let module = ImportPath::new(module)
            .map_err(|e| format!("line {}: {e}: '{module}'", number + 1))?;
        modules.insert(module, version);
    }
    Ok(modules)
}
