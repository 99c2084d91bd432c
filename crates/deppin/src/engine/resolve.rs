//! Resolution of one traced world into nodes and edges.

use std::collections::{BTreeMap, BTreeSet};

use deppin_config::Options;
use deppin_graph::{ImportPath, Revision, WorldId};
use rayon::prelude::*;
use tracing::debug;

use super::trace::WorldTrace;
use crate::error::{Result, UnresolvedEntry, UnresolvedReason};
use crate::locator::{Locator, Lookup};
use crate::toolchain::Package;

/// Nodes and edges contributed by one world.
///
/// Unresolved sightings are kept as nodes. Whether they are errors is only
/// known once every world is fused, so the entries the policy would reject
/// travel alongside as candidates.
#[derive(Debug, Clone)]
pub(crate) struct WorldResolution {
    pub world: WorldId,
    /// Node revisions, sorted.
    pub nodes: Vec<Revision>,
    /// Edges between the root and nodes.
    pub edges: BTreeSet<(Revision, Revision)>,
    /// Unresolved nodes the policy does not permit.
    pub unpermitted: Vec<UnresolvedEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    /// Never a node and never traversed: standard library, unlisted imports,
    /// the target itself.
    Hidden,
    /// Never a node, but edges are routed through it.
    Transparent,
    Visible,
}

struct Classifier<'a> {
    trace: &'a WorldTrace,
    locator: &'a Locator,
    target: &'a ImportPath,
}

impl Classifier<'_> {
    fn visibility(&self, import_path: &ImportPath) -> Visibility {
        if import_path == self.target {
            return Visibility::Hidden;
        }
        let Some(package) = self.trace.package(import_path) else {
            return Visibility::Hidden;
        };
        if package.is_standard {
            Visibility::Hidden
        } else if package.is_internal || self.locator.project().is_first_party(import_path) {
            Visibility::Transparent
        } else {
            Visibility::Visible
        }
    }

    /// Visible packages reachable from `package` through transparent ones.
    fn successors(&self, package: &Package) -> BTreeSet<ImportPath> {
        let mut visible = BTreeSet::new();
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&ImportPath> = package.imports.iter().collect();

        while let Some(import) = stack.pop() {
            if !seen.insert(import) {
                continue;
            }
            match self.visibility(import) {
                Visibility::Hidden => {}
                Visibility::Visible => {
                    visible.insert(import.clone());
                }
                Visibility::Transparent => {
                    if let Some(inner) = self.trace.package(import) {
                        stack.extend(inner.imports.iter());
                    }
                }
            }
        }
        visible
    }
}

/// The node revision for a lookup, plus the entry to report should the
/// node still be unresolved after fusion.
fn judge(
    lookup: Lookup,
    node: &ImportPath,
    world: &WorldId,
    options: &Options,
) -> (Revision, Option<UnresolvedEntry>) {
    let (resolver, reason) = match lookup {
        Lookup::Pinned { revision, .. } => return (revision, None),
        Lookup::Allowlisted(revision) => return (revision, None),
        Lookup::NotPinned { resolver } => (Some(resolver), UnresolvedReason::NotPinned),
        Lookup::NotFound => (None, UnresolvedReason::NoResolver),
    };
    let revision = Revision::unresolved(node.clone());
    if options.permits_unresolved(node.as_str()) {
        return (revision, None);
    }
    let entry = UnresolvedEntry {
        import_path: node.clone(),
        resolver,
        world: world.clone(),
        reason,
    };
    (revision, Some(entry))
}

/// Route edges from the root through transparent packages, then resolve
/// every visible package in parallel.
pub(crate) fn resolve_world(
    trace: &WorldTrace,
    locator: &Locator,
    options: &Options,
    target: &ImportPath,
) -> Result<WorldResolution> {
    let world = trace.world.id();
    let classifier = Classifier {
        trace,
        locator,
        target,
    };

    // Package-level reachability from the root over visible packages.
    let mut reached: BTreeMap<&ImportPath, &Package> = BTreeMap::new();
    let mut package_edges: Vec<(ImportPath, ImportPath)> = Vec::new();
    let mut queue: Vec<&Package> = vec![&trace.root];

    while let Some(package) = queue.pop() {
        for next in classifier.successors(package) {
            package_edges.push((package.import_path.clone(), next.clone()));
            if let Some(next_package) = trace.package(&next) {
                if !reached.contains_key(&next_package.import_path) {
                    reached.insert(&next_package.import_path, next_package);
                    queue.push(next_package);
                }
            }
        }
    }

    let verdicts: Vec<(ImportPath, Revision, Option<UnresolvedEntry>)> = reached
        .par_iter()
        .map(|(import_path, package)| {
            let node = import_path.unvendor();
            let lookup = locator.lookup(package, &node)?;
            let (revision, entry) = judge(lookup, &node, &world, options);
            Ok(((*import_path).clone(), revision, entry))
        })
        .collect::<Result<_>>()?;

    // Keyed by the vendored path so that two copies of one package keep
    // their own revisions.
    let mut resolved: BTreeMap<ImportPath, Revision> = BTreeMap::new();
    let mut unpermitted = Vec::new();
    for (import_path, revision, entry) in verdicts {
        resolved.insert(import_path, revision);
        unpermitted.extend(entry);
    }
    let root = Revision::root(target.clone());
    let node_of = |import_path: &ImportPath| -> Option<Revision> {
        if import_path == target {
            Some(root.clone())
        } else {
            resolved.get(import_path).cloned()
        }
    };
    let edges: BTreeSet<(Revision, Revision)> = package_edges
        .iter()
        .filter_map(|(from, to)| Some((node_of(from)?, node_of(to)?)))
        .filter(|(from, to)| from != to)
        .collect();

    let mut nodes: Vec<Revision> = resolved.values().cloned().collect();
    nodes.sort();
    nodes.dedup();

    debug!(
        world = %world,
        nodes = nodes.len(),
        unpermitted = unpermitted.len(),
        "resolved world"
    );

    Ok(WorldResolution {
        world,
        nodes,
        edges,
        unpermitted,
    })
}
