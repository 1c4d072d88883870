//! `pitlane rewrite-urls` command implementation.

use pitlane_cache::RewriteReport;
use pitlane_config::PitlaneToml;
use pitlane_core::error::{PitlaneError, PitlaneResult};
use std::collections::HashMap;

use super::{metadata_injector, CommandContext};

/// Execute the `pitlane rewrite-urls` command
pub async fn execute(overwrite: bool, ctx: &CommandContext) -> PitlaneResult<()> {
    let mut overrides = HashMap::new();
    if overwrite {
        overrides.insert("overwrite".to_string(), "true".to_string());
    }

    let (config, _) = ctx.load_config(overrides).await?;
    let report = run(&config).await?;
    print_report(&report, ctx);

    Ok(())
}

/// Run the download URL pass over every kind on a blocking thread
pub async fn run(config: &PitlaneToml) -> PitlaneResult<RewriteReport> {
    let injector = metadata_injector(config)?;
    let install_root = config.paths.install_root.clone().into_std_path_buf();

    tokio::task::spawn_blocking(move || injector.rewrite_every_kind(&install_root))
        .await
        .map_err(|e| {
            PitlaneError::io(
                "Download URL pass did not complete".to_string(),
                std::io::Error::new(std::io::ErrorKind::Other, e),
            )
        })
}

/// Summarize a pass; individual failures are only warnings
pub fn print_report(report: &RewriteReport, ctx: &CommandContext) {
    for error in &report.errors {
        ctx.output.warn(&error.to_string());
    }

    ctx.output.success(&format!(
        "Download URLs: {} updated, {} blacklisted, {} already set, {} failed",
        report.updated,
        report.blacklisted,
        report.existing,
        report.errors.len()
    ));
}
