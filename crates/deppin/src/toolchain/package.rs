//! Package records and decoding of the tool's JSON stream.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use deppin_graph::ImportPath;
use serde::Deserialize;

/// One package as reported by the build tool under a single world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub import_path: ImportPath,
    /// Source directory; empty when the tool could not locate the package.
    pub dir: PathBuf,
    pub is_standard: bool,
    pub is_internal: bool,
    pub imports: BTreeSet<ImportPath>,
    /// Transitive dependencies, when the tool reports them.
    pub deps: BTreeSet<ImportPath>,
    pub tool_error: Option<String>,
}

impl Package {
    /// A package the tool could not trace.
    pub fn failed(import_path: ImportPath, error: impl Into<String>) -> Self {
        let is_internal = import_path.is_internal();
        Self {
            import_path,
            dir: PathBuf::new(),
            is_standard: false,
            is_internal,
            imports: BTreeSet::new(),
            deps: BTreeSet::new(),
            tool_error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.tool_error.is_none()
    }
}

/// Directory that governs a vendored package: the parent of the innermost
/// `vendor` component of its source directory.
pub(crate) fn vendor_root(dir: &Path) -> Option<PathBuf> {
    let components: Vec<Component<'_>> = dir.components().collect();
    let position = components
        .iter()
        .rposition(|c| c.as_os_str() == "vendor")?;
    Some(components[..position].iter().collect())
}

#[derive(Debug, Deserialize)]
struct RawError {
    #[serde(rename = "Err", default)]
    err: String,
}

/// Subset of the tool's package JSON that the analyzer reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPackage {
    import_path: String,
    #[serde(default)]
    dir: String,
    #[serde(default)]
    standard: bool,
    #[serde(default)]
    imports: Vec<String>,
    #[serde(default)]
    deps: Vec<String>,
    #[serde(default)]
    error: Option<RawError>,
    #[serde(default)]
    deps_errors: Vec<RawError>,
}

fn import_set(raw: Vec<String>) -> Result<BTreeSet<ImportPath>, String> {
    raw.into_iter()
        .map(|path| ImportPath::new(path.as_str()).map_err(|e| format!("{e}: '{path}'")))
        .collect()
}

impl TryFrom<RawPackage> for Package {
    type Error = String;

    fn try_from(raw: RawPackage) -> Result<Self, Self::Error> {
        let import_path = ImportPath::new(raw.import_path.as_str())
            .map_err(|e| format!("{e}: '{}'", raw.import_path))?;
        let is_standard = raw.standard || import_path.is_synthetic_standard();
        let is_internal = import_path.is_internal();

        if !raw.deps_errors.is_empty() {
            tracing::trace!(
                import_path = %import_path,
                count = raw.deps_errors.len(),
                first = %raw.deps_errors[0].err,
                "dependency errors reported"
            );
        }

        Ok(Self {
            import_path,
            dir: PathBuf::from(raw.dir),
            is_standard,
            is_internal,
            imports: import_set(raw.imports)?,
            deps: import_set(raw.deps)?,
            tool_error: raw
                .error
                .map(|e| e.err.trim().to_string())
                .filter(|e| !e.is_empty()),
        })
    }
}

/// Decode a stream of concatenated JSON package objects.
///
/// Returns a human readable reason on failure.
pub fn decode_packages(stdout: &[u8]) -> Result<Vec<Package>, String> {
    serde_json::Deserializer::from_slice(stdout)
        .into_iter::<RawPackage>()
        .map(|raw| raw.map_err(|e| e.to_string()).and_then(Package::try_from))
        .collect()
}
