//! Utility functions and helpers.
//!
//! Common functionality used across multiple Pitlane crates.

pub mod path;

// Re-export commonly used utilities
pub use path::{
    is_safe_item_name, strip_archive_suffix, to_archive_path, validate_item_name, ARCHIVE_SUFFIX,
};
