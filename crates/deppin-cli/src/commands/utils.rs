//! Helpers shared by the commands.

use std::path::PathBuf;

use deppin::{CancelSignal, Module, ModuleAnalyzer};
use deppin_config::ConfigDiscovery;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::cli::TargetArgs;
use crate::error::{CliError, Result};

/// Module directory from `--dir`, defaulting to the current directory.
pub fn module_dir(args: &TargetArgs) -> Result<PathBuf> {
    let dir = match &args.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    if !dir.is_dir() {
        return Err(CliError::DirNotFound(dir));
    }
    Ok(dir)
}

/// Merge defaults, `deppin.toml`, `DEPPIN_*` and `overrides` into the
/// untyped module record the analyzer decodes.
pub fn load_module(args: &TargetArgs, overrides: Map<String, Value>) -> Result<Module> {
    let dir = module_dir(args)?;

    let mut discovery = ConfigDiscovery::new(&dir);
    if let Some(config) = &args.config {
        discovery = discovery.with_config_file(config.clone());
    }
    let options = discovery.load_with(overrides)?;
    debug!(dir = %dir.display(), options = ?options, "resolved options");

    let options = match serde_json::to_value(options)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Ok(Module {
        dir,
        build_target: args.target.clone(),
        options,
    })
}

pub async fn analyzer(args: &TargetArgs, overrides: Map<String, Value>) -> Result<ModuleAnalyzer> {
    let module = load_module(args, overrides)?;
    Ok(ModuleAnalyzer::new(module).await?)
}

/// A signal that fires on the first Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancelSignal {
    let signal = CancelSignal::new();
    let remote = signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; canceling analysis");
            remote.cancel();
        }
    });
    signal
}
