use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ImportPath;

/// A pinned (or explicitly unpinned) version of an import path.
///
/// `revision` is opaque: a commit hash, a tag, or a version string. It is
/// compared for equality only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Revision {
    pub name: ImportPath,
    pub revision: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_unresolved: bool,
}

impl Revision {
    /// A revision pinned to a concrete identifier.
    pub fn pinned(name: ImportPath, revision: impl Into<String>) -> Self {
        Self {
            name,
            revision: revision.into(),
            is_unresolved: false,
        }
    }

    /// A revision that could not be pinned.
    pub fn unresolved(name: ImportPath) -> Self {
        Self {
            name,
            revision: String::new(),
            is_unresolved: true,
        }
    }

    /// Revision of the analysis target itself. It carries no identifier and
    /// is exempt from the unresolved policy.
    pub fn root(name: ImportPath) -> Self {
        Self {
            name,
            revision: String::new(),
            is_unresolved: false,
        }
    }

    /// Same revision, attached to a different name. Prefix-matching
    /// resolvers answer for a module but nodes are keyed by package.
    pub fn renamed(&self, name: ImportPath) -> Self {
        Self {
            name,
            revision: self.revision.clone(),
            is_unresolved: self.is_unresolved,
        }
    }

    /// Returns `true` if the revision carries a non-empty identifier.
    pub fn is_pinned(&self) -> bool {
        !self.revision.is_empty()
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.revision.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}@{}", self.name, self.revision)
        }
    }
}
