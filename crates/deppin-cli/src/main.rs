//! deppin CLI - pinned dependency graphs for import-path based projects.
//!
//! Parses arguments, initializes logging and dispatches to a command.

use clap::Parser;
use deppin_cli::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::set_quiet(args.quiet);
    if args.no_color {
        console::set_colors_enabled_stderr(false);
    }

    let result = match args.command {
        cli::Command::Analyze(analyze_args) => commands::analyze_execute(analyze_args).await,
        cli::Command::Build(target_args) => commands::build_execute(target_args).await,
        cli::Command::Clean(target_args) => commands::clean_execute(target_args).await,
        cli::Command::Check(target_args) => commands::check_execute(target_args).await,
    };

    result.map_err(error::cli_error_to_miette)
}
