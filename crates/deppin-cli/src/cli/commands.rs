use clap::{Args, Subcommand};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::cli::enums::OutputFormat;
use crate::cli::validation::{parse_strategy, parse_target};

/// Available deppin subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the pinned dependency graph of a build target
    ///
    /// Traces the target's imports under every configured build-constraint
    /// world and pins each dependency from the lockfile that governs it.
    Analyze(AnalyzeArgs),

    /// Build the target with the build tool
    Build(TargetArgs),

    /// Remove the target's build artifacts
    Clean(TargetArgs),

    /// Report whether the target is built; exits non-zero when it is not
    Check(TargetArgs),
}

/// Target selection shared by every command
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Import path of the build target
    ///
    /// Examples:
    ///   deppin analyze example.org/app
    ///   deppin analyze example.org/app/cmd/server --dir ./src/app
    #[arg(value_name = "TARGET", value_parser = parse_target)]
    pub target: String,

    /// Module directory the build tool runs in (defaults to the current directory)
    #[arg(short = 'C', long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Config file to use instead of <DIR>/deppin.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for the analyze command
///
/// Every flag overrides the same key from `deppin.toml` and `DEPPIN_*`
/// environment variables; flags left unset keep those values.
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Analysis strategy
    ///
    /// - import-trace:union: trace every configured world (default)
    /// - import-trace: trace the host world only
    /// - manifest: read the detected lockfile without tracing
    /// - manifest:<format>: read the lockfile of one format
    #[arg(long, value_name = "STRATEGY", value_parser = parse_strategy)]
    pub strategy: Option<String>,

    /// Extra build tags, appended to every world
    #[arg(long = "tags", value_name = "TAG", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Visit every known OS and architecture in addition to the host
    #[arg(long)]
    pub all_tags: bool,

    /// Allow any dependency to stay unresolved
    #[arg(long)]
    pub allow_unresolved: bool,

    /// Import-path prefix allowed to stay unresolved (repeatable)
    #[arg(long, value_name = "PREFIX")]
    pub allow_unresolved_prefix: Vec<String>,

    /// Consult lockfiles inside vendored dependencies
    #[arg(long)]
    pub allow_nested_vendor: bool,

    /// Keep walking past more than one vendor directory
    #[arg(long)]
    pub allow_deep_vendor: bool,

    /// Consult lockfiles outside the project root
    #[arg(long)]
    pub allow_external_vendor: bool,

    /// Import-path prefix allowed to use external lockfiles (repeatable)
    #[arg(long, value_name = "PREFIX")]
    pub allow_external_vendor_prefix: Vec<String>,

    /// Pass -mod=vendor to the build tool
    #[arg(long)]
    pub modules_vendor: bool,

    /// Trust the lockfile and never trace imports
    #[arg(long)]
    pub skip_tracing: bool,

    /// Use the module directory as the project root
    #[arg(long)]
    pub skip_project: bool,

    /// Lockfile to read, relative to the module directory
    #[arg(long, value_name = "FILE")]
    pub lockfile: Option<PathBuf>,

    /// Manifest whose directory is the project root
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Write the graph to FILE instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl AnalyzeArgs {
    /// Option keys set on the command line, in config spelling.
    pub fn overrides(&self) -> Map<String, Value> {
        let mut map = Map::new();
        let flags = [
            ("all-tags", self.all_tags),
            ("allow-unresolved", self.allow_unresolved),
            ("allow-nested-vendor", self.allow_nested_vendor),
            ("allow-deep-vendor", self.allow_deep_vendor),
            ("allow-external-vendor", self.allow_external_vendor),
            ("modules-vendor", self.modules_vendor),
            ("skip-tracing", self.skip_tracing),
            ("skip-project", self.skip_project),
        ];
        for (key, set) in flags {
            if set {
                map.insert(key.to_string(), Value::Bool(true));
            }
        }

        let lists = [
            ("tags", &self.tags),
            ("allow-unresolved-prefix", &self.allow_unresolved_prefix),
            ("allow-external-vendor-prefix", &self.allow_external_vendor_prefix),
        ];
        for (key, values) in lists {
            if !values.is_empty() {
                map.insert(key.to_string(), Value::from(values.clone()));
            }
        }

        if let Some(strategy) = &self.strategy {
            map.insert("strategy".to_string(), Value::from(strategy.clone()));
        }
        let paths = [("lockfile", &self.lockfile), ("manifest", &self.manifest)];
        for (key, path) in paths
            .into_iter()
            .filter_map(|(key, path)| path.as_ref().map(|path| (key, path)))
        {
            map.insert(
                key.to_string(),
                Value::from(path.to_string_lossy().into_owned()),
            );
        }
        map
    }
}
