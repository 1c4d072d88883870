//! `pitlane build` command implementation.
//!
//! Primes the cache for a single item, or with `--dry-run` lists the entries
//! its archive would contain.

use pitlane_cache::{ArchiveBuilder, RetrievalService};
use pitlane_core::error::{PitlaneError, PitlaneResult};
use pitlane_core::utils::validate_item_name;
use pitlane_core::AssetKind;
use std::collections::HashMap;
use std::sync::Arc;

use super::{retrieval_config, CommandContext};

/// Execute the `pitlane build` command
pub async fn execute(kind: &str, name: &str, dry_run: bool, ctx: &CommandContext) -> PitlaneResult<()> {
    let kind: AssetKind = kind.parse()?;
    validate_item_name(name)?;

    let (config, _) = ctx.load_config(HashMap::new()).await?;
    let paths = retrieval_config(&config);

    if !kind.item_dir(&paths.install_root, name).is_dir() {
        return Err(PitlaneError::ItemNotFound {
            kind,
            name: name.to_string(),
        });
    }

    if dry_run {
        let builder = ArchiveBuilder::new(paths.install_root, paths.cache_root);
        let plan = builder.plan(kind, name)?;

        for entry in &plan.entries {
            ctx.output.info(&entry.archive_path);
        }
        ctx.output.success(&format!("{} files would be archived", plan.len()));
        return Ok(());
    }

    let service = Arc::new(RetrievalService::new(paths));
    let name = name.to_string();
    let bytes = {
        let service = Arc::clone(&service);
        let name = name.clone();
        tokio::task::spawn_blocking(move || service.fetch(kind, &name))
            .await
            .map_err(|e| {
                PitlaneError::io(
                    "Archive build did not complete".to_string(),
                    std::io::Error::new(std::io::ErrorKind::Other, e),
                )
            })??
    };

    let path = service.cache().archive_path(kind, &name);
    if service.build_count() == 0 {
        ctx.output.success(&format!("Already cached: {} ({} bytes)", path.display(), bytes.len()));
    } else {
        ctx.output.success(&format!("Built {} ({} bytes)", path.display(), bytes.len()));
    }

    Ok(())
}
