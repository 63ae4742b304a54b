//! deps CLI
//!
//! Checks and installs the packages that catalog features depend on.

mod cli;
mod commands;
mod config;
mod error;
mod interactive;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::Context;
use config::DepsConfig;
use error::Result;

fn main() {
    if let Err(e) = run() {
        if e.is_silent() {
            tracing::debug!(error = %e, "Exiting without installing");
        } else {
            eprintln!("{}: {}", "error".red().bold(), e);
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    tracing::debug!("Verbose mode enabled");

    let config = DepsConfig::load(cli.config.as_deref())?;
    let assume_yes = matches!(cli.command, Commands::Ensure { yes: true, .. });
    let ctx = Context::new(config, assume_yes)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(execute_command(&ctx, cli.command))
}

async fn execute_command(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Features { json } => commands::run_features(ctx, json),
        Commands::Check { feature, json } => commands::run_check(ctx, &feature, json).await,
        Commands::Ensure {
            feature, action, ..
        } => commands::run_ensure(ctx, &feature, action.as_deref()).await,
        Commands::Install { packages } => commands::run_install(ctx, &packages).await,
    }
}
