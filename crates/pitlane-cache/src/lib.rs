//! Archive cache for Pitlane
//!
//! This crate builds zip archives of installable content items, keeps them in
//! a filesystem-backed cache, and patches each item's metadata so the
//! companion installer knows where to download it from.

pub mod archive;
pub mod metadata;
pub mod retrieval;
pub mod store;

// Re-export main types
pub use archive::{list_entries, ArchiveBuilder, ArchivePlan, PlannedEntry};
pub use metadata::{MetadataInjector, RewriteOutcome, RewriteReport};
pub use retrieval::{RetrievalConfig, RetrievalService};
pub use store::ArchiveCache;

use pitlane_core::error::PitlaneError;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, PitlaneError>;
