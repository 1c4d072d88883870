//! Shared application state

use pitlane_cache::RetrievalService;
use std::sync::Arc;

/// State shared by the router
///
/// Without a retrieval service the download subsystem is disabled and its
/// route is not mounted.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub retrieval: Option<Arc<RetrievalService>>,
}

impl AppState {
    pub fn new(retrieval: RetrievalService) -> Self {
        Self {
            retrieval: Some(Arc::new(retrieval)),
        }
    }

    /// State with downloads turned off
    pub fn disabled() -> Self {
        Self::default()
    }
}
