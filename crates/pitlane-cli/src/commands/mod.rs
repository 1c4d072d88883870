//! Command implementations and dispatch logic.
//!
//! Each command is an async function taking the shared `CommandContext`.

use camino::Utf8PathBuf;
use pitlane_cache::{MetadataInjector, RetrievalConfig};
use pitlane_config::{ConfigLoader, ConfigSource, PitlaneToml};
use pitlane_core::error::{PitlaneError, PitlaneResult};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

pub mod build;
pub mod check;
pub mod rewrite;
pub mod serve;


use crate::{output::OutputHandler, Commands};

/// Command names offered as typo suggestions
const COMMAND_NAMES: [&str; 6] = ["serve", "rewrite-urls", "build", "check", "version", "help"];

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub config_path: Option<Utf8PathBuf>,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Create a context for the current working directory
    pub fn new(config_path: Option<PathBuf>) -> PitlaneResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| PitlaneError::io("Failed to get current directory".to_string(), e))?;

        Ok(Self {
            cwd: utf8_path(cwd, "cwd")?,
            config_path: config_path.map(|p| utf8_path(p, "--config")).transpose()?,
            output: OutputHandler::new(),
        })
    }

    /// Load, layer and validate the configuration
    pub async fn load_config(
        &self,
        cli_overrides: HashMap<String, String>,
    ) -> PitlaneResult<(PitlaneToml, ConfigSource)> {
        let loader = ConfigLoader::new(self.cwd.clone());
        let (config, source) = loader
            .load(self.config_path.as_deref(), cli_overrides)
            .await?;

        match &source {
            ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => {
                info!(path = %path, "loaded configuration")
            },
            ConfigSource::Defaults => info!("no pitlane.toml found, using defaults and overrides"),
        }

        Ok((config, source))
    }
}

fn utf8_path(path: PathBuf, field: &str) -> PitlaneResult<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|p| PitlaneError::ConfigValidation {
        field: field.to_string(),
        reason: format!("path '{}' is not valid UTF-8", p.display()),
    })
}

/// Paths for the retrieval service from a validated configuration
pub fn retrieval_config(config: &PitlaneToml) -> RetrievalConfig {
    RetrievalConfig {
        install_root: config.paths.install_root.clone().into_std_path_buf(),
        cache_root: config.paths.cache_root.clone().into_std_path_buf(),
    }
}

/// Metadata injector from a validated configuration
pub fn metadata_injector(config: &PitlaneToml) -> PitlaneResult<MetadataInjector> {
    MetadataInjector::new(
        config.base_url()?,
        config.urls.authors_blacklist.clone(),
        config.urls.overwrite,
    )
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> PitlaneResult<()> {
    match command {
        Commands::Serve {
            listen,
            skip_rewrite,
        } => serve::execute(listen, skip_rewrite, ctx).await,
        Commands::RewriteUrls { overwrite } => rewrite::execute(overwrite, ctx).await,
        Commands::Build {
            kind,
            name,
            dry_run,
        } => build::execute(&kind, &name, dry_run, ctx).await,
        Commands::Check => check::execute(ctx).await,
        Commands::Version => show_version(ctx),
    }
}

/// Report an unrecognized command, suggesting the closest known one
pub fn unknown_command(input: &str, ctx: &CommandContext) -> PitlaneResult<()> {
    ctx.output.error(&format!("Unknown command '{}'", input));
    if let Some(suggestion) = suggest_similar_command(input) {
        ctx.output.info(&format!("Did you mean '{}'?", suggestion));
    }
    ctx.output.info("Run 'pitlane help' to see available commands.");

    Err(PitlaneError::ConfigValidation {
        field: "command".to_string(),
        reason: format!("Unknown command: {}", input),
    })
}

/// Show help information
pub fn show_help(ctx: &CommandContext) -> PitlaneResult<()> {
    ctx.output.info("pitlane - content archive download service");
    ctx.output.info("");
    ctx.output.info("Usage: pitlane [--config PATH] [--verbose] <COMMAND>");
    ctx.output.info("");
    ctx.output.info("Commands:");
    ctx.output.info("  serve                    Rewrite download URLs, then serve archives");
    ctx.output.info("  rewrite-urls             Rewrite download URLs and exit");
    ctx.output.info("  build <kind> <name>      Build and cache one archive");
    ctx.output.info("  check                    Validate configuration");
    ctx.output.info("  version                  Show version information");
    ctx.output.info("");
    ctx.output.info("Run 'pitlane <command> --help' for more information on a command.");
    Ok(())
}

fn show_version(ctx: &CommandContext) -> PitlaneResult<()> {
    let target = format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS);

    ctx.output.info(&format!("pitlane v{}", env!("CARGO_PKG_VERSION")));
    ctx.output.field("Built", env!("PITLANE_BUILD_DATE"));
    ctx.output.field("Target", &target);
    ctx.output.field("Rust", env!("PITLANE_RUSTC_VERSION"));

    Ok(())
}

/// Suggest similar commands based on edit distance
pub fn suggest_similar_command(input: &str) -> Option<&'static str> {
    COMMAND_NAMES
        .iter()
        .map(|&command| (edit_distance(input, command), command))
        .filter(|&(distance, _)| distance <= 2)
        .min_by_key(|&(distance, _)| distance)
        .map(|(_, command)| command)
}

/// Levenshtein distance between two strings
fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();

    for (i, a_char) in a.chars().enumerate() {
        let mut current = Vec::with_capacity(previous.len());
        current.push(i + 1);

        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != *b_char);
            let value = (previous[j + 1] + 1) // deletion
                .min(current[j] + 1) // insertion
                .min(previous[j] + cost); // substitution
            current.push(value);
        }

        previous = current;
    }

    previous[b_chars.len()]
}
