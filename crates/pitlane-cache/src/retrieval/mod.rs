//! Cache-aside archive retrieval
//!
//! `fetch` serves an item's archive from the cache when present and builds
//! it otherwise. Builds for the same item are serialized; the cache is
//! checked again under the lock so waiters reuse the archive the first
//! caller produced instead of rebuilding it.

mod flight;

pub use flight::{FlightKey, KeyedLocks};

use pitlane_core::error::PitlaneError;
use pitlane_core::utils::validate_item_name;
use pitlane_core::AssetKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::archive::ArchiveBuilder;
use crate::store::ArchiveCache;
use crate::CacheResult;

/// Paths the retrieval service works with
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Server installation holding `content/cars` and `content/tracks`
    pub install_root: PathBuf,
    /// Directory archives are cached under
    pub cache_root: PathBuf,
}

/// Serves item archives, building them on first request
#[derive(Debug)]
pub struct RetrievalService {
    install_root: PathBuf,
    cache: ArchiveCache,
    builder: ArchiveBuilder,
    in_flight: KeyedLocks,
    builds: AtomicU64,
}

impl RetrievalService {
    pub fn new(config: RetrievalConfig) -> Self {
        Self {
            cache: ArchiveCache::new(config.cache_root.clone()),
            builder: ArchiveBuilder::new(config.install_root.clone(), config.cache_root),
            install_root: config.install_root,
            in_flight: KeyedLocks::new(),
            builds: AtomicU64::new(0),
        }
    }

    /// Return the archive bytes for an item
    ///
    /// Fails with `ItemNotFound` when neither a cached archive nor the item
    /// directory exists, and with `BuildFailed` when the archive could not be
    /// produced.
    pub fn fetch(&self, kind: AssetKind, name: &str) -> CacheResult<Vec<u8>> {
        validate_item_name(name)?;

        if let Some(bytes) = self.cache.get(kind, name) {
            debug!(kind = %kind, name, "cache hit");
            return Ok(bytes);
        }

        self.in_flight.run((kind, name.to_string()), || {
            // Another request may have built it while we waited
            if let Some(bytes) = self.cache.get(kind, name) {
                debug!(kind = %kind, name, "built by concurrent request");
                return Ok(bytes);
            }

            if !kind.item_dir(&self.install_root, name).is_dir() {
                return Err(PitlaneError::ItemNotFound {
                    kind,
                    name: name.to_string(),
                });
            }

            info!(kind = %kind, name, "cache miss, building archive");
            self.builds.fetch_add(1, Ordering::Relaxed);
            self.builder.build(kind, name)?;

            self.cache.get(kind, name).ok_or_else(|| PitlaneError::BuildFailed {
                kind,
                name: name.to_string(),
                message: "archive missing after build".to_string(),
                source: None,
            })
        })
    }

    /// Number of archive builds started since creation
    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }

    pub fn cache(&self) -> &ArchiveCache {
        &self.cache
    }
}
