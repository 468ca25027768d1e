// External crates
use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

// Local modules
mod cli;
mod commands;

use cli::Args;
use commands::execute_command;

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => dock_config::load(path)?,
        None => dock_config::discover()?,
    };

    let _log_guard = dock_logging::init_subscriber(&config.logging.clone().with_env_overrides())
        .context("Failed to initialize logging")?;
    debug!("Running {:?}", args.command);

    execute_command(args.command, config)
}
