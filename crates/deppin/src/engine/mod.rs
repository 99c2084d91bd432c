//! Analysis engine.
//!
//! Runs the selected strategy for one target:
//!
//! 1. **import-trace**: list the target and its transitive imports under
//!    every configured world, concurrently
//! 2. resolve each world's visible packages through the [`Locator`], in
//!    parallel within the world
//! 3. fuse the worlds in configured order into one [`DependencyGraph`]
//!
//! The **manifest** strategy (and `skip-tracing`) reads the governing
//! lockfile instead and never calls the build tool.

mod manifest;
mod merge;
mod resolve;
mod trace;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use deppin_config::{Options, Strategy, World, expand_worlds};
use deppin_graph::{DependencyGraph, ImportPath};
use once_cell::sync::OnceCell;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::cancel::CancelSignal;
use crate::error::{Error, Result};
use crate::locator::{Locator, Project, ProjectCache};
use crate::toolchain::Toolchain;
use merge::Fusion;
use trace::{TraceOutcome, WorldTrace};

/// Worlds a strategy visits. `import-trace` sees the host only; the union
/// strategy expands the configured worlds.
pub fn worlds_for(options: &Options) -> Vec<World> {
    match options.strategy {
        Strategy::ImportTrace => vec![World::host(options.tags.clone())],
        _ => expand_worlds(options),
    }
}

fn join_error(error: JoinError) -> Error {
    if error.is_panic() {
        std::panic::resume_unwind(error.into_panic());
    }
    Error::Canceled
}

#[derive(Debug, Clone)]
pub struct Engine {
    toolchain: Toolchain,
    options: Arc<Options>,
    module_dir: PathBuf,
    /// Project discovery shared by every analysis and every clone. Created
    /// on first use, once the search roots are known.
    projects: Arc<OnceCell<ProjectCache>>,
}

impl Engine {
    pub fn new(toolchain: Toolchain, options: Options, module_dir: impl Into<PathBuf>) -> Self {
        Self {
            toolchain,
            options: Arc::new(options),
            module_dir: module_dir.into(),
            projects: Arc::new(OnceCell::new()),
        }
    }

    fn projects(&self, search_roots: &[PathBuf]) -> &ProjectCache {
        self.projects
            .get_or_init(|| ProjectCache::new(search_roots.to_vec()))
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn module_dir(&self) -> &Path {
        &self.module_dir
    }

    pub fn worlds(&self) -> Vec<World> {
        worlds_for(&self.options)
    }

    /// Whether the lockfile is read instead of tracing imports.
    pub fn reads_lockfile_only(&self) -> bool {
        self.options.strategy.is_manifest() || self.options.skip_tracing
    }

    pub async fn analyze(&self, target: &ImportPath) -> Result<DependencyGraph> {
        self.analyze_with_cancel(target, &CancelSignal::new()).await
    }

    /// Analyze `target`, abandoning all outstanding work once `signal`
    /// fires. No graph is returned on cancellation.
    pub async fn analyze_with_cancel(
        &self,
        target: &ImportPath,
        signal: &CancelSignal,
    ) -> Result<DependencyGraph> {
        signal.guard(self.run(target)).await
    }

    async fn run(&self, target: &ImportPath) -> Result<DependencyGraph> {
        info!(
            target = %target,
            strategy = %self.options.strategy,
            skip_tracing = self.options.skip_tracing,
            "analyzing"
        );

        let graph = if self.reads_lockfile_only() {
            let target = target.clone();
            let engine = self.clone();
            tokio::task::spawn_blocking(move || {
                let projects = engine.projects(&[]);
                manifest::analyze(&target, &engine.module_dir, &engine.options, projects)
            })
            .await
            .map_err(join_error)??
        } else {
            self.trace_and_resolve(target).await?
        };

        info!(
            target = %target,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            unresolved = graph.unresolved().count(),
            "analysis complete"
        );
        Ok(graph)
    }

    /// Trace every world concurrently. Results come back in configured
    /// world order regardless of completion order.
    async fn trace_worlds(&self, target: &ImportPath) -> Result<Vec<TraceOutcome>> {
        let worlds = self.worlds();
        let mut slots: Vec<Option<TraceOutcome>> = Vec::with_capacity(worlds.len());
        slots.resize_with(worlds.len(), || None);

        let mut tasks = JoinSet::new();
        for (index, world) in worlds.into_iter().enumerate() {
            let toolchain = self.toolchain.clone();
            let target = target.clone();
            tasks.spawn(async move {
                let outcome = trace::trace_world(&toolchain, &target, world).await;
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined.map_err(join_error)?;
            slots[index] = Some(outcome?);
        }

        Ok(slots.into_iter().flatten().collect())
    }

    fn project(
        &self,
        target: &ImportPath,
        anchor: &WorldTrace,
        search_roots: &[PathBuf],
    ) -> Project {
        if self.options.skip_project {
            return Project::at(&self.module_dir, target, &anchor.root.dir);
        }
        self.projects(search_roots)
            .discover(target, &anchor.root.dir)
    }

    async fn trace_and_resolve(&self, target: &ImportPath) -> Result<DependencyGraph> {
        let env = self.toolchain.env().await?;
        debug!(
            version = %env.version,
            search_roots = env.search_roots.len(),
            "build tool environment"
        );

        let mut traces = Vec::new();
        let mut failures = Vec::new();
        for outcome in self.trace_worlds(target).await? {
            match outcome {
                TraceOutcome::Traced(trace) => traces.push(trace),
                TraceOutcome::Unbuildable(failure) => {
                    warn!(
                        target = %target,
                        world = %failure.world,
                        error = %failure.error,
                        "target cannot be built in this world; skipping it"
                    );
                    failures.push(failure);
                }
            }
        }

        // The host world is last when it survives.
        let Some(anchor) = traces
            .iter()
            .rev()
            .find(|trace| trace.world.is_host())
            .or_else(|| traces.first())
        else {
            return Err(Error::TargetUnbuildable {
                target: target.clone(),
                failures,
            });
        };

        let project = self.project(target, anchor, &env.search_roots);
        debug!(
            root = %project.root.display(),
            import_path = %project.import_path,
            lockfile = ?project.lockfile,
            "project"
        );
        let locator = Arc::new(Locator::new(
            project,
            env.search_roots.clone(),
            Arc::clone(&self.options),
        ));

        let mut fusion = Fusion::new(target.clone());
        for trace in traces {
            let locator = Arc::clone(&locator);
            let options = Arc::clone(&self.options);
            let target = target.clone();
            let resolution = tokio::task::spawn_blocking(move || {
                resolve::resolve_world(&trace, &locator, &options, &target)
            })
            .await
            .map_err(join_error)??;
            fusion.absorb(resolution)?;
        }

        debug!(bound_dirs = locator.bound_dirs(), "resolver bindings");
        fusion.finish()
    }
}
