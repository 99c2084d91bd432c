//! Layered option loading for CLI use.
//!
//! Priority: explicit overrides > `DEPPIN_*` environment > `deppin.toml` >
//! defaults. Library callers holding a [`Module`](crate::Module) decode its
//! option map directly instead.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::options::{OPTION_KEYS, Options};

pub const CONFIG_FILE: &str = "deppin.toml";
pub const ENV_PREFIX: &str = "DEPPIN_";

/// Finds and merges option sources rooted at a module directory.
///
/// # Example
///
/// ```no_run
/// use deppin_config::ConfigDiscovery;
///
/// let options = ConfigDiscovery::new(".").load().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
    config_file: Option<PathBuf>,
    use_env: bool,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config_file: None,
            use_env: true,
        }
    }

    /// Use an explicit config file instead of `<root>/deppin.toml`.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Ignore `DEPPIN_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Locate the config file, if any.
    pub fn find(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_file {
            return Some(path.clone());
        }
        let path = self.root.join(CONFIG_FILE);
        path.is_file().then_some(path)
    }

    pub fn load(&self) -> Result<Options> {
        self.load_with(Map::new())
    }

    /// Merge every source, applying `overrides` (kebab-case keys) last.
    ///
    /// # Errors
    ///
    /// `NotFound` when an explicit config file is missing, `Load` when a
    /// source fails to parse or holds an invalid value.
    pub fn load_with(&self, overrides: Map<String, Value>) -> Result<Options> {
        let mut figment = Figment::new().merge(Serialized::defaults(Options::default()));

        if let Some(path) = self.find() {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path));
            }
            debug!(path = %path.display(), "loading config file");
            figment = figment.merge(Toml::file(path));
        }

        if self.use_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).filter_map(|key| {
                let key = key.as_str().to_ascii_lowercase().replace('_', "-");
                OPTION_KEYS.contains(&key.as_str()).then(|| key.into())
            }));
        }

        if !overrides.is_empty() {
            figment = figment.merge(Serialized::defaults(overrides));
        }

        figment
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))
    }
}
