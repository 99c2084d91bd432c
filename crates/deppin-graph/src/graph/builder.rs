//! Incremental construction of a [`DependencyGraph`].

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::{Adjacency, DependencyGraph};
use crate::{GraphError, ImportPath, Revision, Result, WorldId};

/// Two worlds pinned the same import path to different revisions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "'{name}' resolved to '{first}' in world '{first_world}' but to '{second}' in world '{second_world}'"
)]
pub struct NodeConflict {
    pub name: ImportPath,
    pub first: String,
    pub first_world: WorldId,
    pub second: String,
    pub second_world: WorldId,
}

/// An unresolved node that gave way to a pinned revision of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folded {
    pub name: ImportPath,
    pub kept: String,
}

/// Mutable graph under construction.
///
/// Nodes are keyed by revision, so two vendored copies of one package that
/// are pinned differently stay apart. Agreement is only enforced across
/// worlds: see [`merge_world`](Self::merge_world).
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    root: Revision,
    nodes: BTreeSet<Revision>,
    edges: BTreeMap<Revision, Adjacency>,
    /// Pinned revisions per name, with the world that first pinned each.
    pins: BTreeMap<ImportPath, BTreeMap<String, WorldId>>,
}

impl GraphBuilder {
    pub fn new(root: Revision) -> Self {
        Self {
            root,
            nodes: BTreeSet::new(),
            edges: BTreeMap::new(),
            pins: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Revision {
        &self.root
    }

    /// Pinned revisions recorded so far for `name`.
    pub fn pinned(&self, name: &ImportPath) -> impl Iterator<Item = &str> {
        self.pins
            .get(name)
            .into_iter()
            .flat_map(|pins| pins.keys().map(String::as_str))
    }

    /// Merge every node sighting of one world.
    ///
    /// Sightings within a world never conflict with each other. When
    /// earlier worlds pinned a name, this world must pin it to at least one
    /// of the same revisions. Unresolved sightings never conflict.
    ///
    /// Returns the number of nodes that were new.
    pub fn merge_world(
        &mut self,
        world: &WorldId,
        revisions: impl IntoIterator<Item = Revision>,
    ) -> std::result::Result<usize, NodeConflict> {
        let revisions: BTreeSet<Revision> = revisions
            .into_iter()
            .filter(|revision| revision.name != self.root.name)
            .collect();

        let mut pinned: BTreeMap<&ImportPath, BTreeSet<&str>> = BTreeMap::new();
        for revision in revisions.iter().filter(|r| r.is_pinned()) {
            pinned
                .entry(&revision.name)
                .or_default()
                .insert(revision.revision.as_str());
        }

        for (name, here) in &pinned {
            let Some(known) = self.pins.get(*name) else {
                continue;
            };
            let elsewhere: Vec<(&String, &WorldId)> = known
                .iter()
                .filter(|(_, first_world)| *first_world != world)
                .collect();
            let Some(&(first, first_world)) = elsewhere.first() else {
                continue;
            };
            if !elsewhere
                .iter()
                .any(|(revision, _)| here.contains(revision.as_str()))
            {
                return Err(NodeConflict {
                    name: (*name).clone(),
                    first: first.clone(),
                    first_world: first_world.clone(),
                    second: here.iter().next().map(|r| r.to_string()).unwrap_or_default(),
                    second_world: world.clone(),
                });
            }
        }

        let mut inserted = 0;
        for revision in revisions {
            if revision.is_pinned() {
                self.pins
                    .entry(revision.name.clone())
                    .or_default()
                    .entry(revision.revision.clone())
                    .or_insert_with(|| world.clone());
            }
            if self.nodes.insert(revision) {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Merge a single node sighting, as a world of one node.
    pub fn merge_node(
        &mut self,
        revision: Revision,
        world: &WorldId,
    ) -> std::result::Result<bool, NodeConflict> {
        self.merge_world(world, [revision]).map(|inserted| inserted > 0)
    }

    /// Add an edge contributed by `world`.
    ///
    /// Self-edges are dropped and reported as `Ok(false)`. Both endpoints
    /// must already be known (the root always is).
    pub fn add_edge(&mut self, from: &Revision, to: &Revision, world: &WorldId) -> Result<bool> {
        if from == to {
            return Ok(false);
        }
        if !self.knows(from) {
            return Err(GraphError::UnknownNode(from.clone()));
        }
        if !self.knows(to) {
            return Err(GraphError::UnknownNode(to.clone()));
        }

        let worlds = self
            .edges
            .entry(from.clone())
            .or_default()
            .entry(to.clone())
            .or_insert_with(BTreeSet::new);
        Ok(worlds.insert(world.clone()))
    }

    fn knows(&self, revision: &Revision) -> bool {
        revision == &self.root || self.nodes.contains(revision)
    }

    /// Replace every unresolved node whose name is pinned somewhere by the
    /// first pinned revision of that name, rerouting its edges.
    pub fn fold_unresolved(&mut self) -> Vec<Folded> {
        let replacements: BTreeMap<Revision, Revision> = self
            .nodes
            .iter()
            .filter(|revision| revision.is_unresolved)
            .filter_map(|revision| {
                let kept = self.pinned(&revision.name).next()?;
                Some((revision.clone(), Revision::pinned(revision.name.clone(), kept)))
            })
            .collect();
        if replacements.is_empty() {
            return Vec::new();
        }

        let target = |revision: &Revision| {
            replacements
                .get(revision)
                .cloned()
                .unwrap_or_else(|| revision.clone())
        };

        let edges = std::mem::take(&mut self.edges);
        for (from, targets) in edges {
            let from = target(&from);
            for (to, worlds) in targets {
                let to = target(&to);
                if from == to {
                    continue;
                }
                self.edges
                    .entry(from.clone())
                    .or_default()
                    .entry(to)
                    .or_default()
                    .extend(worlds);
            }
        }
        for unresolved in replacements.keys() {
            self.nodes.remove(unresolved);
        }

        replacements
            .into_iter()
            .map(|(unresolved, kept)| Folded {
                name: unresolved.name,
                kept: kept.revision,
            })
            .collect()
    }

    /// Unresolved nodes left after folding.
    pub fn unresolved(&self) -> impl Iterator<Item = &Revision> {
        self.nodes.iter().filter(|revision| revision.is_unresolved)
    }

    /// Fold unresolved sightings and freeze the graph, dropping everything
    /// unreachable from the root.
    pub fn build(mut self) -> DependencyGraph {
        self.fold_unresolved();

        let mut reachable: BTreeSet<Revision> = BTreeSet::new();
        let mut queue = VecDeque::new();
        reachable.insert(self.root.clone());
        queue.push_back(self.root.clone());

        while let Some(current) = queue.pop_front() {
            if let Some(targets) = self.edges.get(&current) {
                for target in targets.keys() {
                    if reachable.insert(target.clone()) {
                        queue.push_back(target.clone());
                    }
                }
            }
        }

        let edges = self
            .edges
            .into_iter()
            .filter(|(from, _)| reachable.contains(from))
            .collect();

        DependencyGraph {
            root: self.root,
            nodes: reachable,
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> ImportPath {
        ImportPath::new(s).unwrap()
    }

    fn pinned(name: &str, revision: &str) -> Revision {
        Revision::pinned(p(name), revision)
    }

    fn root() -> Revision {
        Revision::root(p("app"))
    }

    #[test]
    fn later_world_must_agree_with_earlier_pins() {
        let mut builder = GraphBuilder::new(root());
        let linux = WorldId::new("os=linux");
        let windows = WorldId::new("os=windows");

        assert_eq!(builder.merge_node(pinned("lib", "v1"), &linux), Ok(true));
        assert_eq!(builder.merge_node(pinned("lib", "v1"), &windows), Ok(false));

        let conflict = builder
            .merge_node(pinned("lib", "v2"), &WorldId::host())
            .unwrap_err();
        assert_eq!(conflict.first, "v1");
        assert_eq!(conflict.first_world, linux);
        assert_eq!(conflict.second, "v2");
        assert_eq!(conflict.second_world, WorldId::host());
    }

    #[test]
    fn one_world_may_pin_two_copies_of_a_name() {
        let mut builder = GraphBuilder::new(root());
        let host = WorldId::host();

        let inserted = builder
            .merge_world(&host, [pinned("y", "outer"), pinned("y", "inner")])
            .unwrap();
        assert_eq!(inserted, 2);

        builder.add_edge(&root(), &pinned("y", "outer"), &host).unwrap();
        builder.add_edge(&root(), &pinned("x", "x1"), &host).unwrap_err();
        builder.merge_node(pinned("x", "x1"), &host).unwrap();
        builder.add_edge(&root(), &pinned("x", "x1"), &host).unwrap();
        builder.add_edge(&pinned("x", "x1"), &pinned("y", "inner"), &host).unwrap();

        let graph = builder.build();
        let revisions: Vec<&str> = graph
            .revisions(&p("y"))
            .map(|r| r.revision.as_str())
            .collect();
        assert_eq!(revisions, vec!["inner", "outer"]);
        graph.validate().unwrap();
    }

    #[test]
    fn a_world_sharing_any_pin_agrees() {
        let mut builder = GraphBuilder::new(root());
        builder
            .merge_world(&WorldId::new("os=linux"), [pinned("y", "outer")])
            .unwrap();
        builder
            .merge_world(
                &WorldId::host(),
                [pinned("y", "outer"), pinned("y", "inner")],
            )
            .unwrap();
        assert_eq!(builder.pinned(&p("y")).count(), 2);
    }

    #[test]
    fn unresolved_sightings_fold_into_pinned_ones() {
        let mut builder = GraphBuilder::new(root());
        let linux = WorldId::new("os=linux");
        let host = WorldId::host();
        let unresolved = Revision::unresolved(p("lib"));

        builder.merge_node(unresolved.clone(), &linux).unwrap();
        builder.add_edge(&root(), &unresolved, &linux).unwrap();
        builder.merge_node(pinned("lib", "v1"), &host).unwrap();
        builder.add_edge(&root(), &pinned("lib", "v1"), &host).unwrap();

        let folded = builder.fold_unresolved();
        assert_eq!(
            folded,
            vec![Folded {
                name: p("lib"),
                kept: "v1".to_string()
            }]
        );
        assert_eq!(builder.unresolved().count(), 0);

        let graph = builder.build();
        assert_eq!(graph.revision(&p("lib")).unwrap().revision, "v1");
        assert_eq!(graph.edge_worlds(&p("app"), &p("lib")).unwrap().len(), 2);
    }

    #[test]
    fn self_edges_are_dropped_and_unknown_nodes_rejected() {
        let mut builder = GraphBuilder::new(root());
        let host = WorldId::host();

        assert!(!builder.add_edge(&root(), &root(), &host).unwrap());
        assert!(matches!(
            builder.add_edge(&root(), &pinned("lib", "v1"), &host),
            Err(GraphError::UnknownNode(_))
        ));
    }

    #[test]
    fn build_prunes_unreachable_nodes() {
        let mut builder = GraphBuilder::new(root());
        let host = WorldId::host();
        builder
            .merge_world(
                &host,
                [
                    pinned("lib", "v1"),
                    pinned("orphan", "v9"),
                    pinned("leaf", "v3"),
                ],
            )
            .unwrap();
        builder.add_edge(&root(), &pinned("lib", "v1"), &host).unwrap();
        builder
            .add_edge(&pinned("orphan", "v9"), &pinned("leaf", "v3"), &host)
            .unwrap();

        let graph = builder.build();
        assert!(graph.contains(&p("lib")));
        assert!(!graph.contains(&p("orphan")));
        assert!(!graph.contains(&p("leaf")));
        assert_eq!(graph.edge_count(), 1);
    }
}
