use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a build-constraint world.
///
/// Edges remember which worlds contributed them, so the identifier must be
/// deterministic for identical inputs (`host`, `os=linux`, `arch=arm64+cgo`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(String);

impl WorldId {
    pub const HOST: &'static str = "host";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn host() -> Self {
        Self(Self::HOST.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_host(&self) -> bool {
        self.0 == Self::HOST || self.0.starts_with("host+")
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
