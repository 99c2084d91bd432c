use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::options::Options;

/// Analysis target handed over by the outer CLI.
///
/// `options` stays untyped until [`Module::decode_options`] so that a bad
/// option is reported against the module that carried it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Module {
    pub dir: PathBuf,
    pub build_target: String,
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl Module {
    pub fn new(dir: impl Into<PathBuf>, build_target: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            build_target: build_target.into(),
            options: Map::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn decode_options(&self) -> Result<Options> {
        Options::from_map(&self.options)
    }
}
