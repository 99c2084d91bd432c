//! Analyzer options.
//!
//! Keys are kebab-case and unknown keys are rejected, so a typo such as
//! `allow-unresolved-prefixes` fails loudly instead of being ignored.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, Result};
use crate::strategy::Strategy;

/// Every recognized option key.
pub const OPTION_KEYS: [&str; 14] = [
    "tags",
    "all-tags",
    "strategy",
    "lockfile",
    "manifest",
    "allow-unresolved",
    "allow-unresolved-prefix",
    "allow-nested-vendor",
    "allow-deep-vendor",
    "allow-external-vendor",
    "allow-external-vendor-prefix",
    "modules-vendor",
    "skip-tracing",
    "skip-project",
];

/// Decoded analyzer options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct Options {
    /// Extra build tags appended to every world.
    #[serde(deserialize_with = "tag_list")]
    pub tags: Vec<String>,

    /// Expand worlds to every known OS and architecture.
    pub all_tags: bool,

    pub strategy: Strategy,

    /// Lockfile override for manifest strategies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lockfile: Option<PathBuf>,

    /// Manifest override for manifest strategies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,

    pub allow_unresolved: bool,

    /// Import-path prefixes allowed to stay unresolved.
    #[serde(deserialize_with = "prefix_list")]
    pub allow_unresolved_prefix: Vec<String>,

    pub allow_nested_vendor: bool,
    pub allow_deep_vendor: bool,
    pub allow_external_vendor: bool,

    /// Import-path prefixes allowed to use external vendor directories.
    #[serde(deserialize_with = "prefix_list")]
    pub allow_external_vendor_prefix: Vec<String>,

    /// Pass `-mod=vendor` to the build tool.
    pub modules_vendor: bool,

    /// Trust the lockfile and never invoke the build tool for tracing.
    pub skip_tracing: bool,

    /// Use the module directory as the project root.
    pub skip_project: bool,
}

impl Options {
    /// Decode options from an untyped JSON value.
    ///
    /// `null` decodes to the defaults.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "options".to_string(),
            hint: e.to_string(),
        })
    }

    /// Decode options from the free-form map carried by a module record.
    pub fn from_map(map: &serde_json::Map<String, Value>) -> Result<Self> {
        Self::from_value(Value::Object(map.clone()))
    }

    /// Whether `import_path` may stay unresolved.
    pub fn permits_unresolved(&self, import_path: &str) -> bool {
        self.allow_unresolved || matches_prefix(&self.allow_unresolved_prefix, import_path)
    }

    /// Whether an external vendor directory may answer for `import_path`.
    pub fn permits_external(&self, import_path: &str) -> bool {
        self.allow_external_vendor
            && (self.allow_external_vendor_prefix.is_empty()
                || matches_prefix(&self.allow_external_vendor_prefix, import_path))
    }
}

fn matches_prefix(prefixes: &[String], import_path: &str) -> bool {
    prefixes
        .iter()
        .any(|prefix| !prefix.is_empty() && import_path.starts_with(prefix.as_str()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

fn split_tokens<'de, D>(
    deserializer: D,
    separators: &[char],
) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<StringOrList>::deserialize(deserializer)? {
        None => return Ok(Vec::new()),
        Some(StringOrList::One(s)) => vec![s],
        Some(StringOrList::Many(list)) => list,
    };

    Ok(raw
        .iter()
        .flat_map(|entry| {
            entry
                .split(|c: char| c.is_whitespace() || separators.contains(&c))
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect())
}

fn tag_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    split_tokens(deserializer, &[','])
}

fn prefix_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    split_tokens(deserializer, &[])
}
