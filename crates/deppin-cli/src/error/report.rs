//! Miette rendering for CLI errors.

use deppin::toolchain::GO_CMD_ENV;
use miette::Report;

use crate::error::CliError;

/// Convert a CliError into a miette report, with a hint where one helps.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match hint(&err) {
        Some(help) => miette::miette!(help = help, "{}", err),
        None => miette::miette!("{}", err),
    }
}

fn hint(err: &CliError) -> Option<String> {
    let CliError::Analysis(err) = err else {
        return match err {
            CliError::NotBuilt { target } => Some(format!("run 'deppin build {target}'")),
            _ => None,
        };
    };

    let help = match err {
        deppin::Error::ToolchainMissing { .. } => {
            format!("install the build tool or point {GO_CMD_ENV} at it")
        }
        deppin::Error::UnresolvedDependency(_) => {
            "pin them in the lockfile or pass --allow-unresolved-prefix".to_string()
        }
        deppin::Error::ResolverNotFound { .. } => {
            "name the lockfile with --lockfile, or use --skip-project".to_string()
        }
        deppin::Error::WorldConflict(_) => {
            "make the lockfiles agree or use --strategy import-trace".to_string()
        }
        deppin::Error::TargetUnbuildable { .. } => {
            "rerun with --verbose to see the build tool's report for each world".to_string()
        }
        _ => return None,
    };
    Some(help)
}
