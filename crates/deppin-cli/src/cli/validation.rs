use deppin::{ImportPath, Strategy};

/// Validate a `--strategy` value, keeping its spelling for config merging.
///
/// Accepted: `import-trace:union` (or empty), `import-trace`, `manifest`
/// and `manifest:<format>`.
pub fn parse_strategy(s: &str) -> Result<String, String> {
    s.parse::<Strategy>()
        .map(|_| s.trim().to_string())
        .map_err(|e| e.to_string())
}

/// Validate a build target import path.
pub fn parse_target(s: &str) -> Result<String, String> {
    ImportPath::new(s)
        .map(ImportPath::into_string)
        .map_err(|e| format!("'{s}' is not an import path: {e}"))
}
