//! stylecheck CLI
//!
//! Checks locally stored styles against their remote sources.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use context::AppContext;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = style_core::logging::init(cli.verbose) {
        return Err(CliError::user(format!("Failed to set up logging: {e}")));
    }
    tracing::debug!(?cli, "parsed arguments");

    let cwd = std::env::current_dir()?;
    let ctx = AppContext::load(&cwd, cli.config.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(execute_command(&ctx, cli.command))
}

async fn execute_command(ctx: &AppContext, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Check { id, dry_run, force } => {
            commands::run_check(ctx, id, dry_run, force).await
        }
        Commands::Log { tail } => commands::run_log(ctx, tail).await,
        Commands::Watch => commands::run_watch(ctx).await,
    }
}
