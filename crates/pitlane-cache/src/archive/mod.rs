//! Zip archive building and inspection
//!
//! This module packages an item directory into a zip whose entries are rooted
//! at the item name, the layout the desktop installer unpacks directly into
//! its own content folder.

pub mod create;
pub mod inspect;

// Re-export main types
pub use create::{ArchiveBuilder, ArchivePlan, PlannedEntry};
pub use inspect::list_entries;
