//! Canned build tool for tests and dry runs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use deppin_config::World;
use parking_lot::Mutex;
use serde_json::{Value, json};

use super::runner::{CommandOutput, CommandRunner, Invocation};

const DEFAULT_WORLD: &str = "";

/// A [`CommandRunner`] answering from canned package listings.
///
/// Listings are keyed by world identifier (`host`, `os=windows`, ...).
/// Packages registered without a world answer for every world that has
/// no specific entry. Unregistered imports whose first segment has no dot
/// are reported as standard library packages.
#[derive(Debug, Default)]
pub struct FakeRunner {
    listings: BTreeMap<String, BTreeMap<String, Value>>,
    missing: bool,
    raw_listing: Option<String>,
    fail_listing: Option<String>,
    fail_build: Option<String>,
    goroot: String,
    gopath: String,
    requires_build: bool,
    built: AtomicBool,
    invocations: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package for every world.
    pub fn package(self, import_path: &str, dir: &str, imports: &[&str]) -> Self {
        self.package_in(DEFAULT_WORLD, import_path, dir, imports)
    }

    /// Register a package for one world only.
    pub fn package_in(
        mut self,
        world: &str,
        import_path: &str,
        dir: &str,
        imports: &[&str],
    ) -> Self {
        let record = json!({
            "ImportPath": import_path,
            "Dir": dir,
            "Imports": imports,
        });
        self.listings
            .entry(world.to_string())
            .or_default()
            .insert(import_path.to_string(), record);
        self
    }

    /// Register a package the tool fails to trace, for every world.
    pub fn broken(self, import_path: &str, error: &str) -> Self {
        self.broken_in(DEFAULT_WORLD, import_path, error)
    }

    pub fn broken_in(mut self, world: &str, import_path: &str, error: &str) -> Self {
        let record = json!({
            "ImportPath": import_path,
            "Error": { "Err": error },
        });
        self.listings
            .entry(world.to_string())
            .or_default()
            .insert(import_path.to_string(), record);
        self
    }

    /// Behave as if the command does not exist.
    pub fn missing(mut self) -> Self {
        self.missing = true;
        self
    }

    /// Answer every listing with this exact stdout.
    pub fn raw_listing(mut self, stdout: &str) -> Self {
        self.raw_listing = Some(stdout.to_string());
        self
    }

    /// Fail every listing with empty stdout and this stderr.
    pub fn fail_listing(mut self, stderr: &str) -> Self {
        self.fail_listing = Some(stderr.to_string());
        self
    }

    pub fn fail_build(mut self, stderr: &str) -> Self {
        self.fail_build = Some(stderr.to_string());
        self
    }

    pub fn env(mut self, goroot: &str, gopath: &str) -> Self {
        self.goroot = goroot.to_string();
        self.gopath = gopath.to_string();
        self
    }

    /// Report every package as broken until `build` runs, and again after `clean`.
    pub fn requires_build(mut self) -> Self {
        self.requires_build = true;
        self
    }

    /// Every invocation seen so far.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    /// Number of `list` invocations seen so far.
    pub fn list_calls(&self) -> usize {
        self.invocations
            .lock()
            .iter()
            .filter(|inv| inv.args.first().map(String::as_str) == Some("list"))
            .count()
    }

    fn world_of(invocation: &Invocation) -> String {
        let tags = invocation
            .args
            .iter()
            .position(|arg| arg == "-tags")
            .and_then(|i| invocation.args.get(i + 1))
            .map(|tags| {
                tags.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        World {
            os: invocation.env_value("GOOS").map(str::to_string),
            arch: invocation.env_value("GOARCH").map(str::to_string),
            tags,
        }
        .id()
        .as_str()
        .to_string()
    }

    fn lookup(&self, world: &str, import_path: &str) -> Option<Value> {
        if let Some(record) = self.listings.get(world).and_then(|l| l.get(import_path)) {
            return Some(record.clone());
        }
        if let Some(record) = self
            .listings
            .get(DEFAULT_WORLD)
            .and_then(|l| l.get(import_path))
        {
            return Some(record.clone());
        }
        let first = import_path.split('/').next().unwrap_or_default();
        (!first.contains('.')).then(|| {
            json!({
                "ImportPath": import_path,
                "Dir": format!("{}/src/{import_path}", self.goroot),
                "Standard": true,
            })
        })
    }

    fn list(&self, invocation: &Invocation) -> CommandOutput {
        if let Some(stdout) = &self.raw_listing {
            return CommandOutput::ok(stdout.clone());
        }
        if let Some(stderr) = &self.fail_listing {
            return CommandOutput::failed(1, stderr.clone());
        }

        let world = Self::world_of(invocation);
        let not_built = self.requires_build && !self.built.load(Ordering::SeqCst);

        let mut skip_value = false;
        let mut stdout = String::new();
        for arg in invocation.args.iter().skip(1) {
            if skip_value {
                skip_value = false;
                continue;
            }
            if arg == "-tags" {
                skip_value = true;
                continue;
            }
            if arg.starts_with('-') {
                continue;
            }
            let Some(mut record) = self.lookup(&world, arg) else {
                continue;
            };
            if not_built {
                record["Error"] = json!({ "Err": "package has not been built" });
            }
            stdout.push_str(&record.to_string());
            stdout.push('\n');
        }
        CommandOutput::ok(stdout)
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        self.invocations.lock().push(invocation.clone());

        if self.missing {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{}: command not found", invocation.program),
            ));
        }

        let output = match invocation.args.first().map(String::as_str) {
            Some("version") => CommandOutput::ok("go version go1.22.0 linux/amd64\n"),
            Some("env") => CommandOutput::ok(
                json!({ "GOROOT": self.goroot, "GOPATH": self.gopath }).to_string(),
            ),
            Some("list") => self.list(invocation),
            Some("build") => match &self.fail_build {
                Some(stderr) => CommandOutput::failed(1, stderr.clone()),
                None => {
                    self.built.store(true, Ordering::SeqCst);
                    CommandOutput::ok("")
                }
            },
            Some("clean") => {
                self.built.store(false, Ordering::SeqCst);
                CommandOutput::ok("")
            }
            _ => CommandOutput::failed(2, "unknown command"),
        };
        Ok(output)
    }
}
