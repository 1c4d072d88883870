//! # pitlane-cli
//!
//! Serves installable content archives for a racing game server.
//!
//! This is the entry point for the `pitlane` binary. It parses commands, sets
//! up logging and the panic hook, and dispatches to the command handlers.

use clap::{Parser, Subcommand};
use pitlane_core::error::{PitlaneError, PitlaneResult};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Content archive download service
#[derive(Parser)]
#[command(name = "pitlane", version, about = "Content archive download service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Unrecognized command, answered with a suggestion
    #[arg(value_name = "COMMAND", hide = true)]
    pub unknown: Option<String>,

    /// Path to pitlane.toml (searched upwards from the working directory otherwise)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite download URLs, then serve archives over HTTP
    Serve {
        /// Address to listen on, overrides server.listen
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
        /// Skip the download URL pass
        #[arg(long)]
        skip_rewrite: bool,
    },
    /// Write download URLs into every item's metadata and exit
    RewriteUrls {
        /// Replace download URLs that are already set
        #[arg(long)]
        overwrite: bool,
    },
    /// Build and cache the archive for one item
    Build {
        /// Content kind ("cars" or "tracks")
        kind: String,
        /// Item directory name
        name: String,
        /// List the archive entries without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate configuration and print the resolved settings
    Check,
    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    debug!("Starting pitlane v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", ErrorFormatter::new().format_error(&e));
            ExitCode::FAILURE
        },
    }
}

fn run_cli(cli: Cli) -> PitlaneResult<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| PitlaneError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let ctx = CommandContext::new(cli.config)?;

        match (cli.command, cli.unknown) {
            (Some(command), _) => commands::dispatch_command(command, &ctx).await,
            (None, Some(unknown)) => commands::unknown_command(&unknown, &ctx),
            (None, None) => commands::show_help(&ctx),
        }
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pitlane={},tower_http={}", level, level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("pitlane encountered an unexpected error: {}", panic_info);
        eprintln!("pitlane crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/pitlane-rs/pitlane/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
