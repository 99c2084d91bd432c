//! The outer interface: one analyzer per module record.

use std::sync::Arc;

use deppin_config::{Module, Options, World};
use deppin_graph::{DependencyGraph, ImportPath};
use tracing::debug;

use crate::cancel::CancelSignal;
use crate::engine::Engine;
use crate::error::Result;
use crate::toolchain::{CommandRunner, ProcessRunner, Toolchain, command_from_env};

/// Clean, build, check and analyze the build target of a [`Module`].
///
/// # Example
///
/// ```rust,no_run
/// use deppin::{Module, ModuleAnalyzer};
///
/// # async fn example() -> deppin::Result<()> {
/// let module = Module::new("/src/example.org/app", "example.org/app")
///     .with_option("allow-unresolved-prefix", "internal.corp/");
/// let analyzer = ModuleAnalyzer::new(module).await?;
///
/// let graph = analyzer.analyze().await?;
/// println!("{}", graph.to_json()?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ModuleAnalyzer {
    module: Module,
    target: ImportPath,
    engine: Engine,
}

impl ModuleAnalyzer {
    /// Analyzer driving the build tool named by `DEPPIN_GO_CMD` (or `go`).
    ///
    /// # Errors
    ///
    /// Fails when the options do not decode, the build target is not an
    /// import path, or the build tool cannot be started.
    pub async fn new(module: Module) -> Result<Self> {
        Self::with_runner(module, Arc::new(ProcessRunner)).await
    }

    /// Analyzer running build tool commands through `runner`.
    pub async fn with_runner(module: Module, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let options = module.decode_options()?;
        let target = ImportPath::new(module.build_target.as_str())?;
        let toolchain = Toolchain::discover(command_from_env(), runner)
            .await?
            .with_dir(module.dir.clone())
            .with_modules_vendor(options.modules_vendor);

        debug!(
            target = %target,
            dir = %module.dir.display(),
            tool = toolchain.version(),
            "module analyzer ready"
        );

        let engine = Engine::new(toolchain, options, module.dir.clone());
        Ok(Self {
            module,
            target,
            engine,
        })
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn target(&self) -> &ImportPath {
        &self.target
    }

    pub fn options(&self) -> &Options {
        self.engine.options()
    }

    /// Worlds the configured strategy will trace.
    pub fn worlds(&self) -> Vec<World> {
        self.engine.worlds()
    }

    pub async fn clean(&self) -> Result<()> {
        self.toolchain().clean(&self.target).await
    }

    pub async fn build(&self) -> Result<()> {
        self.toolchain().build(&self.target).await
    }

    /// `true` iff the host world lists the target without a package error.
    pub async fn is_built(&self) -> Result<bool> {
        let host = World::host(self.options().tags.clone());
        let package = self.toolchain().list_one(&self.target, &host).await?;
        Ok(package.is_ok())
    }

    pub async fn analyze(&self) -> Result<DependencyGraph> {
        self.engine.analyze(&self.target).await
    }

    pub async fn analyze_with_cancel(&self, signal: &CancelSignal) -> Result<DependencyGraph> {
        self.engine.analyze_with_cancel(&self.target, signal).await
    }

    fn toolchain(&self) -> &Toolchain {
        self.engine.toolchain()
    }
}
