//! Fusion of per-world results into one graph.

use std::collections::{BTreeMap, BTreeSet};

use deppin_graph::{DependencyGraph, GraphBuilder, ImportPath, Revision};
use tracing::warn;

use super::resolve::WorldResolution;
use crate::error::{Error, Result, UnresolvedEntry, UnresolvedReport};

/// Accumulates worlds in configured order.
///
/// A world may pin one import path to several revisions (vendored copies).
/// Across worlds, a name pinned earlier must be pinned to at least one of
/// the same revisions later. The unresolved policy is applied only in
/// [`finish`](Self::finish), after unresolved sightings had the chance to
/// fold into pinned ones from other worlds.
#[derive(Debug)]
pub(crate) struct Fusion {
    builder: GraphBuilder,
    /// First unpermitted sighting per name.
    pending: BTreeMap<ImportPath, UnresolvedEntry>,
}

impl Fusion {
    pub fn new(target: ImportPath) -> Self {
        Self {
            builder: GraphBuilder::new(Revision::root(target)),
            pending: BTreeMap::new(),
        }
    }

    /// # Errors
    ///
    /// [`Error::WorldConflict`] when the world pins a name only to
    /// revisions no earlier world used.
    pub fn absorb(&mut self, resolution: WorldResolution) -> Result<()> {
        let WorldResolution {
            world,
            nodes,
            edges,
            unpermitted,
        } = resolution;

        self.builder.merge_world(&world, nodes)?;
        for (from, to) in &edges {
            self.builder.add_edge(from, to, &world)?;
        }
        for entry in unpermitted {
            self.pending.entry(entry.import_path.clone()).or_insert(entry);
        }
        Ok(())
    }

    /// Freeze the graph, or report every import that is still unresolved
    /// and not permitted.
    pub fn finish(mut self) -> Result<DependencyGraph> {
        for folded in self.builder.fold_unresolved() {
            warn!(
                import_path = %folded.name,
                revision = %folded.kept,
                "unresolved in some worlds but pinned in others; keeping the pinned revision"
            );
        }

        let unresolved: BTreeSet<&ImportPath> =
            self.builder.unresolved().map(|revision| &revision.name).collect();
        let mut report = UnresolvedReport::default();
        for (name, entry) in &self.pending {
            if unresolved.contains(name) {
                report.push(entry.clone());
            }
        }
        if !report.is_empty() {
            report.sort();
            return Err(Error::UnresolvedDependency(report));
        }

        let graph = self.builder.build();
        graph.validate()?;
        Ok(graph)
    }
}
