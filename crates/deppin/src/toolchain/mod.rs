//! Toolchain adapter.
//!
//! Every call to the external build tool goes through [`Toolchain`]. The
//! tool is treated as a black box: package listings are decoded from its
//! JSON output, and per-package failures are folded into
//! [`Package::tool_error`] instead of aborting.

mod fake;
mod package;
mod runner;

pub use fake::FakeRunner;
pub use package::{Package, decode_packages};
pub use runner::{CommandOutput, CommandRunner, Invocation, ProcessRunner};

pub(crate) use package::vendor_root;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use deppin_config::World;
use deppin_graph::ImportPath;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Environment variable naming the build tool command.
pub const GO_CMD_ENV: &str = "DEPPIN_GO_CMD";
pub const DEFAULT_GO_CMD: &str = "go";

/// Build tool command from the environment, falling back to `go`.
pub fn command_from_env() -> String {
    std::env::var(GO_CMD_ENV)
        .ok()
        .filter(|cmd| !cmd.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_GO_CMD.to_string())
}

/// What the tool reports about its own installation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolEnv {
    pub version: String,
    pub goroot: Option<PathBuf>,
    /// Directories that bound upward filesystem walks.
    pub search_roots: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct RawEnv {
    #[serde(default)]
    goroot: String,
    #[serde(default)]
    gopath: String,
}

/// Handle on the external build tool.
#[derive(Debug, Clone)]
pub struct Toolchain {
    command: String,
    runner: Arc<dyn CommandRunner>,
    limiter: Arc<Semaphore>,
    dir: Option<PathBuf>,
    modules_vendor: bool,
    version: String,
}

impl Toolchain {
    /// Check that the tool runs by asking for its `version`.
    ///
    /// # Errors
    ///
    /// [`Error::ToolchainMissing`] when the command cannot be spawned.
    pub async fn discover(
        command: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        let command = command.into();
        let invocation = Invocation::new(command.clone()).arg("version");
        let output = runner
            .run(&invocation)
            .await
            .map_err(|source| Error::ToolchainMissing {
                command: command.clone(),
                source,
            })?;
        if !output.success {
            return Err(Error::ToolchainFailed {
                command: invocation.display(),
                status: output.status(),
                stderr: output.stderr_lossy(),
            });
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(command = %command, version = %version, "found build tool");

        let permits = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Ok(Self {
            command,
            runner,
            limiter: Arc::new(Semaphore::new(permits.max(1))),
            dir: None,
            modules_vendor: false,
            version,
        })
    }

    /// Working directory for every invocation.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Resolve imports through the vendor directory in module mode.
    pub fn with_modules_vendor(mut self, enabled: bool) -> Self {
        self.modules_vendor = enabled;
        self
    }

    /// Cap on concurrent subprocesses.
    pub fn with_max_concurrency(mut self, permits: usize) -> Self {
        self.limiter = Arc::new(Semaphore::new(permits.max(1)));
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn invocation(&self) -> Invocation {
        let mut invocation = Invocation::new(self.command.clone());
        if let Some(dir) = &self.dir {
            invocation = invocation.current_dir(dir.clone());
        }
        invocation
    }

    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        // The semaphore is never closed.
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| Error::Canceled)?;
        debug!(command = %invocation.display(), "running build tool");
        self.runner
            .run(invocation)
            .await
            .map_err(|source| Error::ToolchainMissing {
                command: self.command.clone(),
                source,
            })
    }

    /// List packages under `world`, one record per requested target.
    ///
    /// Targets the tool does not report come back as failed packages, so
    /// every requested target has a record.
    pub async fn list_packages(
        &self,
        targets: &[ImportPath],
        world: &World,
    ) -> Result<Vec<Package>> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let mut invocation = self.invocation().arg("list").args(["-e", "-json"]);
        if !world.tags.is_empty() {
            invocation = invocation.arg("-tags").arg(world.tags.join(" "));
        }
        if self.modules_vendor {
            invocation = invocation.arg("-mod=vendor");
        }
        for (key, value) in world.env() {
            invocation = invocation.env(key, value);
        }
        invocation = invocation.args(targets.iter().map(|t| t.as_str().to_string()));

        let output = self.run(&invocation).await?;

        if !output.success && output.stdout.iter().all(u8::is_ascii_whitespace) {
            let stderr = output.stderr_lossy();
            let error = if stderr.is_empty() {
                output.status()
            } else {
                stderr
            };
            warn!(world = %world, error = %error, "package listing failed");
            return Ok(targets
                .iter()
                .map(|target| Package::failed(target.clone(), error.clone()))
                .collect());
        }

        let decoded = decode_packages(&output.stdout).map_err(|reason| {
            Error::ToolchainMalformedOutput {
                command: invocation.display(),
                reason,
            }
        })?;

        let mut by_path: BTreeMap<ImportPath, Package> = decoded
            .into_iter()
            .map(|package| (package.import_path.clone(), package))
            .collect();

        Ok(targets
            .iter()
            .map(|target| {
                by_path.remove(target).unwrap_or_else(|| {
                    Package::failed(target.clone(), "package not reported by the build tool")
                })
            })
            .collect())
    }

    /// The record [`list_packages`](Self::list_packages) returns for one target.
    pub async fn list_one(&self, target: &ImportPath, world: &World) -> Result<Package> {
        let mut packages = self
            .list_packages(std::slice::from_ref(target), world)
            .await?;
        Ok(packages.pop().unwrap_or_else(|| {
            Package::failed(target.clone(), "package not reported by the build tool")
        }))
    }

    /// Installation details and search roots.
    pub async fn env(&self) -> Result<ToolEnv> {
        let invocation = self
            .invocation()
            .arg("env")
            .args(["-json", "GOROOT", "GOPATH"]);
        let output = self.run(&invocation).await?;
        if !output.success {
            return Err(Error::ToolchainFailed {
                command: invocation.display(),
                status: output.status(),
                stderr: output.stderr_lossy(),
            });
        }

        let raw: RawEnv = serde_json::from_slice(&output.stdout).map_err(|e| {
            Error::ToolchainMalformedOutput {
                command: invocation.display(),
                reason: e.to_string(),
            }
        })?;

        let goroot = (!raw.goroot.is_empty()).then(|| PathBuf::from(&raw.goroot));
        let mut search_roots: Vec<PathBuf> = goroot.iter().map(|root| root.join("src")).collect();
        if !raw.gopath.is_empty() {
            search_roots.extend(std::env::split_paths(&raw.gopath).map(|entry| entry.join("src")));
        }

        Ok(ToolEnv {
            version: self.version.clone(),
            goroot,
            search_roots,
        })
    }

    /// `clean` the target.
    pub async fn clean(&self, target: &ImportPath) -> Result<()> {
        self.delegate("clean", target).await
    }

    /// `build` the target.
    pub async fn build(&self, target: &ImportPath) -> Result<()> {
        self.delegate("build", target).await
    }

    async fn delegate(&self, subcommand: &str, target: &ImportPath) -> Result<()> {
        let invocation = self.invocation().arg(subcommand).arg(target.as_str());
        let output = self.run(&invocation).await?;
        if output.success {
            Ok(())
        } else {
            Err(Error::ToolchainFailed {
                command: invocation.display(),
                status: output.status(),
                stderr: output.stderr_lossy(),
            })
        }
    }
}

/// Whether `dir` is one of the tool's search roots.
pub(crate) fn is_search_root(search_roots: &[PathBuf], dir: &Path) -> bool {
    search_roots.iter().any(|root| root == dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> ImportPath {
        ImportPath::new(s).unwrap()
    }

    async fn toolchain(runner: FakeRunner) -> Toolchain {
        Toolchain::discover("go", Arc::new(runner)).await.unwrap()
    }

    #[tokio::test]
    async fn discover_reports_missing_tool() {
        let runner = FakeRunner::new().missing();
        let err = Toolchain::discover("go", Arc::new(runner)).await.unwrap_err();
        assert!(matches!(err, Error::ToolchainMissing { .. }));
    }

    #[tokio::test]
    async fn list_one_matches_list_packages() {
        let runner = FakeRunner::new().package(
            "example.org/app",
            "/src/app",
            &["example.org/lib", "fmt"],
        );
        let toolchain = toolchain(runner).await;
        let host = World::host(Vec::new());

        let one = toolchain.list_one(&p("example.org/app"), &host).await.unwrap();
        let many = toolchain
            .list_packages(&[p("example.org/app")], &host)
            .await
            .unwrap();
        assert_eq!(many, vec![one]);
    }

    #[tokio::test]
    async fn unreported_targets_become_failed_packages() {
        let toolchain = toolchain(FakeRunner::new()).await;
        let host = World::host(Vec::new());

        let package = toolchain.list_one(&p("ghost.org/pkg"), &host).await.unwrap();
        assert!(package.tool_error.is_some());
        assert!(package.imports.is_empty());
    }

    #[tokio::test]
    async fn failing_listing_marks_every_target() {
        let runner = FakeRunner::new().fail_listing("no Go files in /src/app");
        let toolchain = toolchain(runner).await;
        let host = World::host(Vec::new());

        let packages = toolchain
            .list_packages(&[p("a/one"), p("a/two")], &host)
            .await
            .unwrap();
        assert_eq!(packages.len(), 2);
        assert!(
            packages
                .iter()
                .all(|pkg| pkg.tool_error.as_deref() == Some("no Go files in /src/app"))
        );
    }

    #[tokio::test]
    async fn malformed_listing_is_fatal() {
        let runner = FakeRunner::new().raw_listing("{ definitely not json");
        let toolchain = toolchain(runner).await;
        let err = toolchain
            .list_one(&p("example.org/app"), &World::host(Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolchainMalformedOutput { .. }));
    }

    #[tokio::test]
    async fn env_reports_search_roots() {
        let runner = FakeRunner::new().env("/usr/lib/go", "/home/dev/go");
        let toolchain = toolchain(runner).await;
        let env = toolchain.env().await.unwrap();

        assert_eq!(env.goroot, Some(PathBuf::from("/usr/lib/go")));
        assert_eq!(
            env.search_roots,
            vec![
                PathBuf::from("/usr/lib/go/src"),
                PathBuf::from("/home/dev/go/src")
            ]
        );
    }

    #[tokio::test]
    async fn world_flags_reach_the_tool() {
        let runner = Arc::new(FakeRunner::new());
        let toolchain = Toolchain::discover("go", runner.clone())
            .await
            .unwrap()
            .with_modules_vendor(true);
        let world = World::for_os("windows", vec!["netgo".to_string()]);

        toolchain.list_one(&p("example.org/app"), &world).await.unwrap();

        let last = runner.invocations().pop().unwrap();
        assert_eq!(
            last.args,
            vec!["list", "-e", "-json", "-tags", "netgo", "-mod=vendor", "example.org/app"]
        );
        assert_eq!(last.env_value("GOOS"), Some("windows"));
    }

    #[tokio::test]
    async fn failed_build_surfaces_stderr() {
        let runner = FakeRunner::new().fail_build("undefined: foo");
        let toolchain = toolchain(runner).await;
        let err = toolchain.build(&p("example.org/app")).await.unwrap_err();
        match err {
            Error::ToolchainFailed { stderr, .. } => assert_eq!(stderr, "undefined: foo"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
