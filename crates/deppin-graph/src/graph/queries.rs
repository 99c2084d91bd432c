//! Read-only queries on a frozen [`DependencyGraph`].
//!
//! Name-based queries cover every revision of an import path. Use
//! [`DependencyGraph::worlds_between`] for a single pair of revisions.

use std::collections::BTreeSet;

use super::DependencyGraph;
use crate::{GraphError, ImportPath, Result, Revision, WorldId};

/// A single edge with the worlds that contributed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge<'a> {
    pub from: &'a Revision,
    pub to: &'a Revision,
    pub worlds: &'a BTreeSet<WorldId>,
}

impl DependencyGraph {
    pub fn root(&self) -> &ImportPath {
        &self.root.name
    }

    pub fn root_revision(&self) -> &Revision {
        &self.root
    }

    /// Every revision of `name` in the graph, in canonical order.
    pub fn revisions<'a, 'b>(&'a self, name: &'b ImportPath) -> impl Iterator<Item = &'a Revision> + use<'a, 'b> {
        self.nodes
            .range(Revision::root(name.clone())..)
            .take_while(move |revision| revision.name == *name)
    }

    /// First revision of `name` in canonical order.
    pub fn revision(&self, name: &ImportPath) -> Option<&Revision> {
        self.revisions(name).next()
    }

    pub fn contains(&self, name: &ImportPath) -> bool {
        self.revision(name).is_some()
    }

    /// All nodes, root included, sorted by import path then revision.
    pub fn nodes(&self) -> impl Iterator<Item = &Revision> {
        self.nodes.iter()
    }

    /// All non-root nodes.
    pub fn dependencies_of_root(&self) -> impl Iterator<Item = &Revision> {
        self.nodes.iter().filter(|revision| **revision != self.root)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|targets| targets.len()).sum()
    }

    /// Direct dependencies of every revision of `name`, sorted.
    pub fn dependencies(&self, name: &ImportPath) -> Vec<&Revision> {
        let targets: BTreeSet<&Revision> = self
            .revisions(name)
            .filter_map(|revision| self.edges.get(revision))
            .flat_map(|targets| targets.keys())
            .collect();
        targets.into_iter().collect()
    }

    /// Nodes with an edge into any revision of `name`, sorted.
    pub fn dependents(&self, name: &ImportPath) -> Vec<&Revision> {
        self.edges
            .iter()
            .filter(|(_, targets)| targets.keys().any(|to| to.name == *name))
            .map(|(from, _)| from)
            .collect()
    }

    /// Worlds that contributed the edge between two exact revisions.
    pub fn worlds_between(&self, from: &Revision, to: &Revision) -> Option<&BTreeSet<WorldId>> {
        self.edges.get(from).and_then(|targets| targets.get(to))
    }

    /// Worlds that contributed any edge from a revision of `from` to a
    /// revision of `to`.
    pub fn edge_worlds(&self, from: &ImportPath, to: &ImportPath) -> Option<BTreeSet<WorldId>> {
        let mut found = None;
        for edge in self
            .edges()
            .filter(|edge| edge.from.name == *from && edge.to.name == *to)
        {
            found
                .get_or_insert_with(BTreeSet::new)
                .extend(edge.worlds.iter().cloned());
        }
        found
    }

    pub fn has_edge(&self, from: &ImportPath, to: &ImportPath) -> bool {
        self.revisions(from).any(|revision| {
            self.edges
                .get(revision)
                .is_some_and(|targets| targets.keys().any(|target| target.name == *to))
        })
    }

    /// Every edge in canonical order.
    pub fn edges(&self) -> impl Iterator<Item = Edge<'_>> {
        self.edges.iter().flat_map(|(from, targets)| {
            targets.iter().map(move |(to, worlds)| Edge { from, to, worlds })
        })
    }

    /// Nodes whose revision is flagged unresolved.
    pub fn unresolved(&self) -> impl Iterator<Item = &Revision> {
        self.nodes.iter().filter(|r| r.is_unresolved)
    }

    /// Check the structural invariants: every edge endpoint is a node, no
    /// self-edges, and every non-root node has an incoming edge.
    pub fn validate(&self) -> Result<()> {
        let mut has_incoming: BTreeSet<&Revision> = BTreeSet::new();

        for edge in self.edges() {
            if edge.from == edge.to {
                return Err(GraphError::SelfEdge(edge.from.clone()));
            }
            if !self.nodes.contains(edge.from) {
                return Err(GraphError::UnknownNode(edge.from.clone()));
            }
            if !self.nodes.contains(edge.to) {
                return Err(GraphError::UnknownNode(edge.to.clone()));
            }
            has_incoming.insert(edge.to);
        }

        for revision in &self.nodes {
            if *revision != self.root && !has_incoming.contains(revision) {
                return Err(GraphError::Orphan(revision.clone()));
            }
        }

        Ok(())
    }
}
