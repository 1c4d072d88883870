//! `pitlane check` command implementation.

use pitlane_config::ConfigSource;
use pitlane_core::error::PitlaneResult;
use pitlane_core::AssetKind;
use std::collections::HashMap;
use std::fs;

use super::{metadata_injector, CommandContext};

/// Execute the `pitlane check` command
pub async fn execute(ctx: &CommandContext) -> PitlaneResult<()> {
    let (config, source) = ctx.load_config(HashMap::new()).await?;

    // Fails on a base domain that cannot carry a download path
    metadata_injector(&config)?;

    let source = match source {
        ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => path.to_string(),
        ConfigSource::Defaults => "defaults and overrides".to_string(),
    };

    ctx.output.info("Resolved configuration:");
    ctx.output.field("source", &source);
    ctx.output.field("listen", &config.server.listen);
    ctx.output.field("downloads enabled", &config.server.enabled.to_string());
    ctx.output.field("install_root", config.paths.install_root.as_str());
    ctx.output.field("cache_root", config.paths.cache_root.as_str());
    ctx.output.field("base_domain", &config.urls.base_domain);
    ctx.output.field("overwrite", &config.urls.overwrite.to_string());
    ctx.output.field("authors_blacklist", &config.urls.authors_blacklist.join(", "));

    let install_root = config.paths.install_root.as_std_path();
    for kind in AssetKind::ALL {
        let content_dir = kind.content_dir(install_root);
        match fs::read_dir(&content_dir) {
            Ok(entries) => {
                let items = entries
                    .filter_map(Result::ok)
                    .filter(|entry| entry.path().is_dir())
                    .count();
                ctx.output.field(kind.category_key(), &format!("{} items", items));
            },
            Err(e) => ctx.output.warn(&format!(
                "Cannot read {}: {}",
                content_dir.display(),
                e
            )),
        }
    }

    ctx.output.success("Configuration is valid");
    Ok(())
}
