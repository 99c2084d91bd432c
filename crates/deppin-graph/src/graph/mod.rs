//! Frozen dependency graph.
//!
//! The graph is built incrementally through [`GraphBuilder`] while worlds are
//! fused, then frozen into a [`DependencyGraph`]. All containers are ordered
//! (`BTreeMap`/`BTreeSet`) so iteration, and therefore serialization, is
//! canonical without an extra sort pass.

mod builder;
mod queries;
mod serialization;

pub use builder::{Folded, GraphBuilder, NodeConflict};
pub use queries::Edge;

use std::collections::{BTreeMap, BTreeSet};

use crate::{Revision, WorldId};

/// Adjacency of a single node: target revision to contributing worlds.
pub(crate) type Adjacency = BTreeMap<Revision, BTreeSet<WorldId>>;

/// Pinned dependency graph rooted at the analysis target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    pub(crate) root: Revision,
    /// Every node including the root. One import path may appear under
    /// several revisions when vendored copies are pinned differently.
    pub(crate) nodes: BTreeSet<Revision>,
    /// Forward edges.
    pub(crate) edges: BTreeMap<Revision, Adjacency>,
}
