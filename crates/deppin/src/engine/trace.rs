//! Import tracing under one build-constraint world.

use std::collections::{BTreeMap, BTreeSet};

use deppin_config::World;
use deppin_graph::ImportPath;
use tracing::{debug, warn};

use crate::error::{Result, WorldFailure};
use crate::toolchain::{Package, Toolchain};

/// Every package reachable from the target in one world.
#[derive(Debug, Clone)]
pub(crate) struct WorldTrace {
    pub world: World,
    pub root: Package,
    /// Listed packages keyed by import path, the root included.
    pub packages: BTreeMap<ImportPath, Package>,
}

impl WorldTrace {
    /// The record for `import_path`. `None` for imports the tool never
    /// lists (`C`, `unsafe`).
    pub fn package(&self, import_path: &ImportPath) -> Option<&Package> {
        self.packages.get(import_path)
    }
}

#[derive(Debug)]
pub(crate) enum TraceOutcome {
    Traced(WorldTrace),
    Unbuildable(WorldFailure),
}

fn followable(import_path: &ImportPath, seen: &BTreeMap<ImportPath, Package>) -> bool {
    !import_path.is_synthetic_standard() && !seen.contains_key(import_path)
}

/// List the target, then its transitive imports breadth first.
///
/// The target's reported `Deps` seed the first batch so most trees are
/// listed in two invocations. Standard packages and packages the tool could
/// not trace are recorded but not followed.
pub(crate) async fn trace_world(
    toolchain: &Toolchain,
    target: &ImportPath,
    world: World,
) -> Result<TraceOutcome> {
    let root = toolchain.list_one(target, &world).await?;
    if let Some(error) = &root.tool_error {
        return Ok(TraceOutcome::Unbuildable(WorldFailure {
            world: world.id(),
            error: error.clone(),
        }));
    }

    let mut packages = BTreeMap::new();
    packages.insert(root.import_path.clone(), root.clone());

    let mut frontier: BTreeSet<ImportPath> = root
        .deps
        .iter()
        .chain(root.imports.iter())
        .filter(|import| followable(import, &packages))
        .cloned()
        .collect();
    let mut rounds = 0usize;

    while !frontier.is_empty() {
        rounds += 1;
        let batch: Vec<ImportPath> = std::mem::take(&mut frontier).into_iter().collect();

        for package in toolchain.list_packages(&batch, &world).await? {
            match &package.tool_error {
                Some(error) => warn!(
                    import_path = %package.import_path,
                    world = %world,
                    error = %error,
                    "package could not be traced; its imports are skipped"
                ),
                None if !package.is_standard => {
                    frontier.extend(
                        package
                            .imports
                            .iter()
                            .filter(|import| followable(import, &packages))
                            .cloned(),
                    );
                }
                None => {}
            }
            packages.insert(package.import_path.clone(), package);
        }
        frontier.retain(|import| !packages.contains_key(import));
    }

    debug!(
        world = %world,
        packages = packages.len(),
        rounds,
        "traced imports"
    );

    Ok(TraceOutcome::Traced(WorldTrace {
        world,
        root,
        packages,
    }))
}
