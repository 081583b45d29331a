//! sitesass - Sass compilation for static sites with import-aware rebuilds.

mod cache;
mod cli;
mod config;
mod deps;
mod freshness;
mod logger;
mod sass;
mod site;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SiteConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = SiteConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { .. } => cli::build::build_and_report(&config).map(|_| ()),
        Commands::Watch { .. } => cli::watch::watch_site(&config),
        Commands::Deps { identifier, .. } => cli::deps::show_deps(&config, identifier.as_deref()),
    }
}
