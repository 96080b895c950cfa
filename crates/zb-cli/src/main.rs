use std::io;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use zb_cli::commands::{battery, buckets, dump, lifelogger};
use zb_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr; stdout carries command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        Commands::Battery(args) => battery::run(&mut out, args, &config)?,
        Commands::Lifelogger(args) => lifelogger::run(&mut out, args, &config)?,
        Commands::Dump(args) => dump::run(&mut out, args, &config)?,
        Commands::Buckets { action } => buckets::run(&mut out, action, &config)?,
    }

    Ok(())
}
