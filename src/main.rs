//! texcache - a hot-reloading texture atlas cache.

#![allow(dead_code)]

mod atlas;
mod cache;
mod cli;
mod config;
mod core;
mod freshness;
mod logger;
mod packer;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::TexCacheConfig;

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
    logger::set_verbose(cli.verbose);

    let config = TexCacheConfig::load(&cli)?;

    match &cli.command {
        Commands::Pack { force } => cli::pack::run_pack(&config, *force),
        Commands::Watch { .. } => cli::watch::run_watch(&config),
        Commands::Inspect { assets, json } => cli::inspect::run_inspect(&config, assets, *json),
    }
}
