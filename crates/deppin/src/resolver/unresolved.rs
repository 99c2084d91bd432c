//! Synthetic resolver for the unresolved allowlist.

use deppin_graph::{ImportPath, Revision};

/// Answers `unresolved` for any import path matching a configured prefix.
#[derive(Debug, Clone, Default)]
pub struct UnresolvedResolver {
    prefixes: Vec<String>,
}

impl UnresolvedResolver {
    /// `None` when there is nothing to allow.
    pub fn from_prefixes(prefixes: &[String]) -> Option<Self> {
        let prefixes: Vec<String> = prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect();
        (!prefixes.is_empty()).then_some(Self { prefixes })
    }

    pub fn resolve(&self, import_path: &ImportPath) -> Option<Revision> {
        import_path
            .matches_any_prefix(&self.prefixes)
            .then(|| Revision::unresolved(import_path.clone()))
    }
}
