//! `pitlane serve` command implementation.
//!
//! Runs the download URL pass to completion, then binds the listener and
//! serves until interrupted.

use pitlane_cache::RetrievalService;
use pitlane_core::error::{PitlaneError, PitlaneResult};
use pitlane_server::AppState;
use std::collections::HashMap;
use tokio::net::TcpListener;
use tracing::info;

use super::{retrieval_config, rewrite, CommandContext};

/// Execute the `pitlane serve` command
pub async fn execute(
    listen: Option<String>,
    skip_rewrite: bool,
    ctx: &CommandContext,
) -> PitlaneResult<()> {
    let mut overrides = HashMap::new();
    if let Some(listen) = listen {
        overrides.insert("listen".to_string(), listen);
    }

    let (config, _) = ctx.load_config(overrides).await?;
    let addr = config.listen_addr()?;

    let state = if config.server.enabled {
        if skip_rewrite {
            info!("skipping download URL pass");
        } else {
            let report = rewrite::run(&config).await?;
            rewrite::print_report(&report, ctx);
        }
        AppState::new(RetrievalService::new(retrieval_config(&config)))
    } else {
        ctx.output.warn("Downloads are disabled (server.enabled = false)");
        AppState::disabled()
    };

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| PitlaneError::io(format!("Failed to bind {}", addr), e))?;

    ctx.output.success(&format!("Serving on http://{}", addr));

    pitlane_server::serve(listener, state)
        .await
        .map_err(|e| PitlaneError::io("HTTP server failed".to_string(), e))
}
