use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const VENDOR_SEGMENT: &str = "vendor";

/// Import paths that the toolchain accepts but that never name a real package
/// directory. Both belong to the standard library view.
const SYNTHETIC_STANDARD: &[&str] = &["C", "unsafe"];

/// Hierarchical, slash-separated identifier of a package.
///
/// Equality is byte-exact. No normalisation happens beyond rejecting empty
/// paths and empty segments, because the toolchain reports import paths
/// verbatim and lockfiles key on the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportPath(String);

impl ImportPath {
    /// Create an import path, rejecting empty paths and empty segments.
    pub fn new(path: impl Into<String>) -> Result<Self, ImportPathError> {
        let path = path.into();

        if path.is_empty() {
            return Err(ImportPathError::Empty);
        }

        if path.split('/').any(str::is_empty) {
            return Err(ImportPathError::EmptySegment(path));
        }

        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Iterate over the slash-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Returns `true` if `self` is `other` or an ancestor of `other` on a
    /// segment boundary (`a/b` is a prefix of `a/b/c` but not of `a/bc`).
    pub fn is_prefix_of(&self, other: &ImportPath) -> bool {
        is_path_prefix(&self.0, &other.0)
    }

    /// Strip everything up to and including the last `vendor` segment.
    ///
    /// `example.org/app/vendor/github.com/x/y` becomes `github.com/x/y`.
    /// Paths without a vendor segment, and paths that end in one, are
    /// returned unchanged.
    pub fn unvendor(&self) -> ImportPath {
        let segments: Vec<&str> = self.0.split('/').collect();
        match segments.iter().rposition(|s| *s == VENDOR_SEGMENT) {
            Some(idx) if idx + 1 < segments.len() => ImportPath(segments[idx + 1..].join("/")),
            _ => self.clone(),
        }
    }

    /// Returns `true` if the path passes through a `vendor` segment.
    pub fn is_vendored(&self) -> bool {
        let segments: Vec<&str> = self.0.split('/').collect();
        segments
            .iter()
            .take(segments.len().saturating_sub(1))
            .any(|s| *s == VENDOR_SEGMENT)
    }

    /// Returns `true` for visibility-restricted `internal` packages.
    pub fn is_internal(&self) -> bool {
        self.segments().any(|s| s == "internal")
    }

    /// Returns `true` for import paths the toolchain synthesizes for the
    /// standard library view (`C`, `unsafe`).
    pub fn is_synthetic_standard(&self) -> bool {
        SYNTHETIC_STANDARD.contains(&self.0.as_str())
    }

    /// Returns `true` if the path starts with any of the given textual
    /// prefixes. Used for user-supplied allowlists, which are matched as
    /// plain string prefixes (`internal.corp/` matches `internal.corp/x`).
    pub fn matches_any_prefix<S: AsRef<str>>(&self, prefixes: &[S]) -> bool {
        prefixes
            .iter()
            .any(|prefix| !prefix.as_ref().is_empty() && self.0.starts_with(prefix.as_ref()))
    }
}

/// Segment-boundary prefix test on raw strings.
pub fn is_path_prefix(prefix: &str, path: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    path == prefix
        || (path.len() > prefix.len()
            && path.starts_with(prefix)
            && path.as_bytes()[prefix.len()] == b'/')
}

impl fmt::Display for ImportPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ImportPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ImportPath {
    type Error = ImportPathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for ImportPath {
    type Error = ImportPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::str::FromStr for ImportPath {
    type Err = ImportPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ImportPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ImportPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ImportPath::new(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportPathError {
    #[error("import path is empty")]
    Empty,

    #[error("import path '{0}' contains an empty segment")]
    EmptySegment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> ImportPath {
        ImportPath::new(s).unwrap()
    }

    #[test]
    fn rejects_empty_and_malformed_paths() {
        assert_eq!(ImportPath::new(""), Err(ImportPathError::Empty));
        assert!(matches!(
            ImportPath::new("a//b"),
            Err(ImportPathError::EmptySegment(_))
        ));
        assert!(ImportPath::new("/a").is_err());
        assert!(ImportPath::new("a/").is_err());
    }

    #[test]
    fn prefix_respects_segment_boundaries() {
        assert!(path("a/b").is_prefix_of(&path("a/b/c")));
        assert!(path("a/b").is_prefix_of(&path("a/b")));
        assert!(!path("a/b").is_prefix_of(&path("a/bc")));
        assert!(!path("a/b/c").is_prefix_of(&path("a/b")));
    }

    #[test]
    fn unvendor_strips_through_last_vendor_segment() {
        assert_eq!(
            path("example.org/app/vendor/github.com/x/y").unvendor(),
            path("github.com/x/y")
        );
        assert_eq!(
            path("example.org/app/vendor/x/vendor/y").unvendor(),
            path("y")
        );
        assert_eq!(path("github.com/x/y").unvendor(), path("github.com/x/y"));
        assert_eq!(path("example.org/vendor").unvendor(), path("example.org/vendor"));
    }

    #[test]
    fn vendored_and_internal_detection() {
        assert!(path("example.org/app/vendor/x").is_vendored());
        assert!(!path("example.org/vendor").is_vendored());
        assert!(path("internal/cpu").is_internal());
        assert!(path("github.com/x/y/internal/z").is_internal());
        assert!(path("github.com/x/internal").is_internal());
        assert!(!path("github.com/x/internals").is_internal());
    }

    #[test]
    fn synthetic_standard_paths() {
        assert!(path("C").is_synthetic_standard());
        assert!(path("unsafe").is_synthetic_standard());
        assert!(!path("fmt").is_synthetic_standard());
    }

    #[test]
    fn textual_prefix_allowlists() {
        let p = path("internal.corp/secret");
        assert!(p.matches_any_prefix(&["internal.corp/"]));
        assert!(!p.matches_any_prefix(&["other/"]));
        assert!(!p.matches_any_prefix(&[""]));
    }

    #[test]
    fn serde_is_a_plain_string() {
        let p = path("example.org/lib");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"example.org/lib\"");
        let back: ImportPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert!(serde_json::from_str::<ImportPath>("\"\"").is_err());
    }
}
