//! Lockfile-only analysis: no tracing, one synthetic edge per entry.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use deppin_config::{ConfigError, LockfileFormat, Options, Strategy, World};
use deppin_graph::{DependencyGraph, ImportPath, Revision, WorldId};
use tracing::{debug, info};

use super::merge::Fusion;
use super::resolve::WorldResolution;
use crate::error::{Error, Result, UnresolvedEntry, UnresolvedReason};
use crate::locator::{Project, ProjectCache};
use crate::resolver::Resolver;

/// Project the manifest flow reads from, without asking the build tool.
fn project(
    target: &ImportPath,
    module_dir: &Path,
    options: &Options,
    projects: &ProjectCache,
) -> Project {
    if let Some(manifest) = &options.manifest {
        let manifest = module_dir.join(manifest);
        if let Some(root) = manifest.parent() {
            return Project::at(root, target, module_dir);
        }
    }
    if options.skip_project {
        return Project::at(module_dir, target, module_dir);
    }
    projects.discover(target, module_dir)
}

fn explicit_format(options: &Options) -> Option<LockfileFormat> {
    match options.strategy {
        Strategy::Manifest(format) => format,
        _ => None,
    }
}

/// The lockfile to read: the override, the strategy's format at the
/// project root, or the one detected there during discovery.
fn locate(
    target: &ImportPath,
    world: &WorldId,
    module_dir: &Path,
    project: &Project,
    options: &Options,
) -> Result<(LockfileFormat, PathBuf)> {
    let not_found = |dir: &Path| Error::ResolverNotFound {
        import_path: target.clone(),
        world: world.clone(),
        dir: dir.to_path_buf(),
    };

    if let Some(lockfile) = &options.lockfile {
        let path = module_dir.join(lockfile);
        let format = explicit_format(options)
            .or_else(|| Resolver::format_of(&path))
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "lockfile".to_string(),
                hint: format!(
                    "cannot tell the format of {}; use strategy manifest:<format>",
                    path.display()
                ),
            })?;
        if !path.exists() {
            return Err(not_found(&path));
        }
        return Ok((format, path));
    }

    let format = explicit_format(options)
        .or(project.lockfile)
        .ok_or_else(|| not_found(&project.root))?;
    let path = project.root.join(format.lockfile_name());
    if !path.exists() {
        return Err(not_found(&project.root));
    }
    Ok((format, path))
}

/// Build the graph from the governing lockfile alone.
pub(crate) fn analyze(
    target: &ImportPath,
    module_dir: &Path,
    options: &Options,
    projects: &ProjectCache,
) -> Result<DependencyGraph> {
    let world = World::host(options.tags.clone()).id();
    let project = project(target, module_dir, options, projects);
    let (format, path) = locate(target, &world, module_dir, &project, options)?;
    let resolver = Resolver::load_file(format, &path)?;

    info!(
        target = %target,
        lockfile = %path.display(),
        format = %format,
        "reading dependencies from lockfile"
    );

    let root = Revision::root(target.clone());
    let mut nodes = Vec::new();
    let mut edges = BTreeSet::new();
    let mut unpermitted = Vec::new();
    for entry in resolver.entries() {
        let name = entry.name.clone();
        if name == *target || entry.name.is_internal() || project.is_first_party(&name) {
            debug!(import_path = %name, "skipping first-party lockfile entry");
            continue;
        }

        let revision = if entry.is_pinned() {
            entry
        } else {
            if !options.permits_unresolved(name.as_str()) {
                unpermitted.push(UnresolvedEntry {
                    import_path: name.clone(),
                    resolver: Some(resolver.describe()),
                    world: world.clone(),
                    reason: UnresolvedReason::NotPinned,
                });
            }
            Revision::unresolved(name)
        };
        edges.insert((root.clone(), revision.clone()));
        nodes.push(revision);
    }

    let mut fusion = Fusion::new(target.clone());
    fusion.absorb(WorldResolution {
        world,
        nodes,
        edges,
        unpermitted,
    })?;
    fusion.finish()
}
