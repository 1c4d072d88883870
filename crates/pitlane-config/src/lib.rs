//! Configuration parsing for Pitlane
//!
//! This crate handles parsing and validation of pitlane.toml, and layers
//! environment variable and command-line overrides on top of it.

pub mod toml;
pub mod merge;

// Re-export main types
pub use crate::toml::{PitlaneToml, ServerSection, PathsSection, UrlsSection};
pub use crate::merge::{ConfigLoader, ConfigLayering, ConfigSource};

use pitlane_core::error::PitlaneError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, PitlaneError>;

/// Name of the configuration file looked up from the working directory
pub const CONFIG_FILE_NAME: &str = "pitlane.toml";
