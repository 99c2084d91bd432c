//! Analyze command implementation.

use std::path::Path;

use deppin::DependencyGraph;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::cli::{AnalyzeArgs, OutputFormat};
use crate::commands::utils;
use crate::error::{CliError, Result};
use crate::ui;

/// Execute the analyze command.
///
/// 1. Merge `deppin.toml`, `DEPPIN_*` and flags into the module options
/// 2. Run the analyzer, canceling on Ctrl-C
/// 3. Write the graph as JSON or DOT to stdout or `--output`
pub async fn execute(args: AnalyzeArgs) -> Result<()> {
    let analyzer = utils::analyzer(&args.target, args.overrides()).await?;
    info!(
        target = %analyzer.target(),
        worlds = analyzer.worlds().len(),
        "analyzing"
    );

    let signal = utils::cancel_on_ctrl_c();
    let graph = analyzer.analyze_with_cancel(&signal).await?;
    let rendered = render(&graph, args.format)?;

    match &args.output {
        Some(path) => {
            write_output(path, &rendered).await?;
            ui::success(&format!(
                "{} dependencies of {} written to {}",
                graph.node_count().saturating_sub(1),
                analyzer.target(),
                path.display()
            ));
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(rendered.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    let unresolved = graph.unresolved().count();
    if unresolved > 0 {
        ui::warning(&format!("{unresolved} dependencies are unresolved"));
    }
    Ok(())
}

/// Serialize the graph, always ending in a newline.
pub fn render(graph: &DependencyGraph, format: OutputFormat) -> Result<String> {
    let mut rendered = match format {
        OutputFormat::Json => graph.to_json().map_err(deppin::Error::from)?,
        OutputFormat::Dot => graph.to_dot(),
    };
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(rendered)
}

async fn write_output(path: &Path, rendered: &str) -> Result<()> {
    let write_error = |source| CliError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    fs::write(path, rendered).await.map_err(write_error)
}
