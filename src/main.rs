//! CLI entry point for bookmatch.

use anyhow::Result;
use bookmatch_core::AppConfig;
use clap::Parser;
use tracing::debug;

mod cli;
mod commands;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    init_tracing(default_level, no_color_requested());

    debug!(?cli, "CLI arguments parsed");

    let config = AppConfig::from_env()?;
    debug!(?config, "configuration loaded");

    match &cli.command {
        Command::Fetch(args) => commands::run_fetch_command(args, &config).await,
        Command::Import(args) => commands::run_import_command(args, &config).await,
        Command::List(args) => commands::run_list_command(args, &config).await,
    }
}

fn no_color_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
        || std::env::var("TERM").is_ok_and(|value| value.eq_ignore_ascii_case("dumb"))
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(default_level: &str, no_color: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}
