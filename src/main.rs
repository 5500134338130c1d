//! `mend` command-line entry point.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use mender::config::MendConfig;
use mender::core;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    mender::logger::set_verbose(cli.verbose());

    let mut config = MendConfig::load(&cli.config)?;
    cli.apply(&mut config);

    match &cli.command {
        Commands::Build { .. } => cli::build::build(&config),
        Commands::Serve { .. } => cli::serve::serve(&config),
    }
}
