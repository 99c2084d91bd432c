//! Exact-match resolvers backed by declarative lockfiles.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use deppin_config::LockfileFormat;
use deppin_graph::{ImportPath, Revision};
use serde::Deserialize;

use super::unparseable;
use crate::error::Result;

/// Index of one lockfile: import path to pinned revision.
#[derive(Debug, Clone)]
pub struct LockfileResolver {
    format: LockfileFormat,
    path: PathBuf,
    /// Every resolvable import path, subpackages included.
    index: BTreeMap<ImportPath, String>,
    /// Top-level entries as listed in the file.
    projects: BTreeMap<ImportPath, String>,
}

impl LockfileResolver {
    pub fn parse(format: LockfileFormat, path: &Path, content: &str) -> Result<Self> {
        let entries = match format {
            LockfileFormat::Dep => parse_dep(content),
            LockfileFormat::Glide => parse_glide(content),
            LockfileFormat::Godep => parse_godep(content),
            LockfileFormat::Govendor => parse_govendor(content),
            LockfileFormat::Vndr | LockfileFormat::Gdm => parse_columns(content),
            LockfileFormat::GoModules | LockfileFormat::Vendor => {
                Err(format!("{format} is not an exact-match lockfile"))
            }
        }
        .map_err(|reason| unparseable(format, path, reason))?;

        let mut resolver = Self {
            format,
            path: path.to_path_buf(),
            index: BTreeMap::new(),
            projects: BTreeMap::new(),
        };

        for entry in entries {
            let name = ImportPath::new(entry.name.as_str())
                .map_err(|e| unparseable(format, path, format!("{e}: '{}'", entry.name)))?;
            for sub in &entry.packages {
                let full = match sub.trim_matches('/') {
                    "" | "." => name.clone(),
                    sub => ImportPath::new(format!("{name}/{sub}"))
                        .map_err(|e| unparseable(format, path, format!("{e}: '{name}/{sub}'")))?,
                };
                resolver.index.insert(full, entry.revision.clone());
            }
            resolver.index.insert(name.clone(), entry.revision.clone());
            resolver.projects.insert(name, entry.revision);
        }

        Ok(resolver)
    }

    pub fn format(&self) -> LockfileFormat {
        self.format
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn resolve(&self, import_path: &ImportPath) -> Option<Revision> {
        self.index
            .get(import_path)
            .map(|revision| to_revision(import_path, revision))
    }

    pub fn entries(&self) -> Vec<Revision> {
        self.projects
            .iter()
            .map(|(name, revision)| to_revision(name, revision))
            .collect()
    }
}

fn to_revision(name: &ImportPath, revision: &str) -> Revision {
    if revision.is_empty() {
        Revision::unresolved(name.clone())
    } else {
        Revision::pinned(name.clone(), revision)
    }
}

/// One entry of any exact-match format, before validation.
#[derive(Debug, PartialEq, Eq)]
struct Entry {
    name: String,
    revision: String,
    packages: Vec<String>,
}

/// Prefer a tag or version over a raw commit when both are present.
fn pick(version: String, revision: String) -> String {
    if version.trim().is_empty() {
        revision.trim().to_string()
    } else {
        version.trim().to_string()
    }
}

#[derive(Debug, Deserialize)]
struct DepLock {
    #[serde(default)]
    projects: Vec<DepProject>,
}

#[derive(Debug, Deserialize)]
struct DepProject {
    name: String,
    #[serde(default)]
    revision: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    packages: Vec<String>,
}

fn parse_dep(content: &str) -> std::result::Result<Vec<Entry>, String> {
    let lock: DepLock = toml::from_str(content).map_err(|e| e.to_string())?;
    Ok(lock
        .projects
        .into_iter()
        .map(|p| Entry {
            name: p.name,
            revision: pick(p.version, p.revision),
            packages: p.packages,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct GlideLock {
    #[serde(default)]
    imports: Vec<GlideImport>,
    #[serde(default, rename = "testImports")]
    test_imports: Vec<GlideImport>,
}

#[derive(Debug, Deserialize)]
struct GlideImport {
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    subpackages: Vec<String>,
}

fn parse_glide(content: &str) -> std::result::Result<Vec<Entry>, String> {
    let lock: GlideLock = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    Ok(lock
        .imports
        .into_iter()
        .chain(lock.test_imports)
        .map(|i| Entry {
            name: i.name,
            revision: i.version.trim().to_string(),
            packages: i.subpackages,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Godeps {
    #[serde(default)]
    deps: Vec<GodepsDep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GodepsDep {
    import_path: String,
    #[serde(default)]
    rev: String,
}

fn parse_godep(content: &str) -> std::result::Result<Vec<Entry>, String> {
    let godeps: Godeps = serde_json::from_str(content).map_err(|e| e.to_string())?;
    Ok(godeps
        .deps
        .into_iter()
        .map(|d| Entry {
            name: d.import_path,
            revision: d.rev.trim().to_string(),
            packages: Vec::new(),
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct GovendorManifest {
    #[serde(default)]
    package: Vec<GovendorPackage>,
}

#[derive(Debug, Deserialize)]
struct GovendorPackage {
    path: String,
    #[serde(default)]
    revision: String,
}

fn parse_govendor(content: &str) -> std::result::Result<Vec<Entry>, String> {
    let manifest: GovendorManifest = serde_json::from_str(content).map_err(|e| e.to_string())?;
    Ok(manifest
        .package
        .into_iter()
        .map(|p| Entry {
            name: p.path,
            revision: p.revision.trim().to_string(),
            packages: Vec::new(),
        })
        .collect())
}

/// `path revision [extra...]` lines with `#` comments (vndr and gdm).
fn parse_columns(content: &str) -> std::result::Result<Vec<Entry>, String> {
    let mut entries = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(name), Some(revision)) = (fields.next(), fields.next()) else {
            return Err(format!("line {}: expected '<path> <revision>'", number + 1));
        };
        entries.push(Entry {
            name: name.to_string(),
            revision: revision.to_string(),
            packages: Vec::new(),
        });
    }
    Ok(entries)
}
