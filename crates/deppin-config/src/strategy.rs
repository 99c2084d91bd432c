//! Analysis strategies and lockfile format tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Identifies which resolver reads a lockfile.
///
/// Declaration order is the detection precedence within one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockfileFormat {
    Dep,
    Glide,
    Godep,
    Govendor,
    Vndr,
    Gdm,
    GoModules,
    Vendor,
}

impl LockfileFormat {
    pub const ALL: [LockfileFormat; 8] = [
        LockfileFormat::Dep,
        LockfileFormat::Glide,
        LockfileFormat::Godep,
        LockfileFormat::Govendor,
        LockfileFormat::Vndr,
        LockfileFormat::Gdm,
        LockfileFormat::GoModules,
        LockfileFormat::Vendor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LockfileFormat::Dep => "dep",
            LockfileFormat::Glide => "glide",
            LockfileFormat::Godep => "godep",
            LockfileFormat::Govendor => "govendor",
            LockfileFormat::Vndr => "vndr",
            LockfileFormat::Gdm => "gdm",
            LockfileFormat::GoModules => "gomodules",
            LockfileFormat::Vendor => "vendor",
        }
    }

    /// Lockfile location relative to the directory it governs.
    pub fn lockfile_name(self) -> &'static str {
        match self {
            LockfileFormat::Dep => "Gopkg.lock",
            LockfileFormat::Glide => "glide.lock",
            LockfileFormat::Godep => "Godeps/Godeps.json",
            LockfileFormat::Govendor => "vendor/vendor.json",
            LockfileFormat::Vndr => "vendor.conf",
            LockfileFormat::Gdm => "Godeps",
            LockfileFormat::GoModules => "go.mod",
            LockfileFormat::Vendor => "vendor",
        }
    }
}

impl fmt::Display for LockfileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockfileFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LockfileFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownFormat(s.to_string()))
    }
}

/// User-selected analysis mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Strategy {
    /// Trace imports under every configured world and union the edges.
    #[default]
    ImportTraceUnion,
    /// Trace imports under the host world only.
    ImportTrace,
    /// Read the lockfile only. `None` auto-detects the format.
    Manifest(Option<LockfileFormat>),
}

impl Strategy {
    pub fn is_manifest(&self) -> bool {
        matches!(self, Strategy::Manifest(_))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::ImportTraceUnion => f.write_str("import-trace:union"),
            Strategy::ImportTrace => f.write_str("import-trace"),
            Strategy::Manifest(None) => f.write_str("manifest"),
            Strategy::Manifest(Some(format)) => write!(f, "manifest:{format}"),
        }
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "import-trace:union" => Ok(Strategy::ImportTraceUnion),
            "import-trace" => Ok(Strategy::ImportTrace),
            "manifest" => Ok(Strategy::Manifest(None)),
            other => match other.strip_prefix("manifest:") {
                Some(format) => format
                    .parse()
                    .map(|format| Strategy::Manifest(Some(format)))
                    .map_err(|_| ConfigError::UnknownStrategy(other.to_string())),
                None => Err(ConfigError::UnknownStrategy(other.to_string())),
            },
        }
    }
}

impl TryFrom<String> for Strategy {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Strategy> for String {
    fn from(strategy: Strategy) -> Self {
        strategy.to_string()
    }
}
