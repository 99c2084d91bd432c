//! Build, clean and check: thin delegations to the build tool.

use serde_json::Map;

use crate::cli::TargetArgs;
use crate::commands::utils;
use crate::error::{CliError, Result};
use crate::ui;

pub async fn build(args: TargetArgs) -> Result<()> {
    let analyzer = utils::analyzer(&args, Map::new()).await?;
    analyzer.build().await?;
    ui::success(&format!("built {}", analyzer.target()));
    Ok(())
}

pub async fn clean(args: TargetArgs) -> Result<()> {
    let analyzer = utils::analyzer(&args, Map::new()).await?;
    analyzer.clean().await?;
    ui::success(&format!("cleaned {}", analyzer.target()));
    Ok(())
}

/// Succeeds iff the host world lists the target without an error.
pub async fn check(args: TargetArgs) -> Result<()> {
    let analyzer = utils::analyzer(&args, Map::new()).await?;
    if analyzer.is_built().await? {
        ui::success(&format!("{} is built", analyzer.target()));
        Ok(())
    } else {
        Err(CliError::NotBuilt {
            target: analyzer.target().to_string(),
        })
    }
}
