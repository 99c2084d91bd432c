//! Error types for analysis.

use std::fmt;
use std::path::PathBuf;

use deppin_config::{ConfigError, LockfileFormat};
use deppin_graph::{GraphError, ImportPath, ImportPathError, NodeConflict, WorldId};

/// The resolver that governed a lookup: its format and backing file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResolverRef {
    pub format: Option<LockfileFormat>,
    pub path: PathBuf,
}

impl fmt::Display for ResolverRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            Some(format) => write!(f, "{format} ({})", self.path.display()),
            None => write!(f, "unresolved allowlist"),
        }
    }
}

/// Why an import ended up without a revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UnresolvedReason {
    /// No resolver in the candidate chain knew the import.
    NoResolver,
    /// A resolver knew the import but had no revision for it.
    NotPinned,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::NoResolver => f.write_str("no governing resolver"),
            UnresolvedReason::NotPinned => f.write_str("no pinned revision"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedEntry {
    pub import_path: ImportPath,
    pub resolver: Option<ResolverRef>,
    pub world: WorldId,
    pub reason: UnresolvedReason,
}

impl fmt::Display for UnresolvedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [world {}]: {}", self.import_path, self.world, self.reason)?;
        if let Some(resolver) = &self.resolver {
            write!(f, " (resolver: {resolver})")?;
        }
        Ok(())
    }
}

/// Every import that failed the unresolved-revision policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnresolvedReport {
    entries: Vec<UnresolvedEntry>,
}

impl UnresolvedReport {
    /// Record an entry. Only the first sighting of an import path is kept.
    pub fn push(&mut self, entry: UnresolvedEntry) {
        if !self
            .entries
            .iter()
            .any(|existing| existing.import_path == entry.import_path)
        {
            self.entries.push(entry);
        }
    }

    pub fn entries(&self) -> &[UnresolvedEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, import_path: &ImportPath) -> bool {
        self.entries.iter().any(|e| &e.import_path == import_path)
    }

    pub(crate) fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.import_path.cmp(&b.import_path));
    }
}

impl fmt::Display for UnresolvedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} unresolved import(s):", self.entries.len())?;
        for entry in &self.entries {
            write!(f, "\n  - {entry}")?;
        }
        Ok(())
    }
}

/// The target failed to build in one world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldFailure {
    pub world: WorldId,
    pub error: String,
}

fn format_failures(failures: &[WorldFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.world, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("build tool '{command}' could not be started: {source}")]
    ToolchainMissing {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("build tool '{command}' produced malformed output: {reason}")]
    ToolchainMalformedOutput { command: String, reason: String },

    #[error("'{command}' failed ({status}): {stderr}")]
    ToolchainFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("target {target} cannot be built in any world: {}", format_failures(.failures))]
    TargetUnbuildable {
        target: ImportPath,
        failures: Vec<WorldFailure>,
    },

    #[error("cannot parse {format} lockfile {}: {reason}", .path.display())]
    LockfileUnparseable {
        format: LockfileFormat,
        path: PathBuf,
        reason: String,
    },

    #[error(
        "no lockfile governs {import_path} in world {world} (searched from {})",
        .dir.display()
    )]
    ResolverNotFound {
        import_path: ImportPath,
        world: WorldId,
        dir: PathBuf,
    },

    #[error("{0}")]
    UnresolvedDependency(UnresolvedReport),

    #[error("world conflict: {0}")]
    WorldConflict(#[from] NodeConflict),

    #[error("analysis canceled")]
    Canceled,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid import path: {0}")]
    ImportPath(#[from] ImportPathError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
