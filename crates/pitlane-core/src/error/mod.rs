//! Error types and result aliases for Pitlane operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the Pitlane crates with actionable error messages.

use crate::types::AssetKind;
use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all Pitlane operations
#[derive(Error, Debug)]
pub enum PitlaneError {
    // Config errors
    #[error("Failed to parse pitlane.toml: {message}")]
    ConfigParse { message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Request errors
    #[error("Unknown content kind '{token}'")]
    UnknownKind { token: String },

    #[error("Invalid item name '{name}': {reason}")]
    InvalidItemName { name: String, reason: String },

    #[error("{kind} item '{name}' not found")]
    ItemNotFound { kind: AssetKind, name: String },

    // Metadata errors
    #[error("Failed to read metadata {}", path.display())]
    MetadataRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse metadata {}: {message}", path.display())]
    MetadataParse { path: PathBuf, message: String },

    #[error("Failed to write metadata {}", path.display())]
    MetadataWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Archive errors
    #[error("Failed to build archive for {kind} item '{name}': {message}")]
    BuildFailed {
        kind: AssetKind,
        name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Pitlane operations
pub type PitlaneResult<T> = Result<T, PitlaneError>;

impl PitlaneError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Create a build failure wrapping any underlying error
    pub fn build_failed<E>(kind: AssetKind, name: &str, message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::BuildFailed {
            kind,
            name: name.to_string(),
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error means the requested item does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PitlaneError::ItemNotFound { .. }
                | PitlaneError::UnknownKind { .. }
                | PitlaneError::InvalidItemName { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            PitlaneError::ConfigParse { .. } | PitlaneError::ConfigValidation { .. } => {
                Some("Run 'pitlane check' to inspect the resolved configuration")
            },
            PitlaneError::UnknownKind { .. } => Some("Known content kinds are 'cars' and 'tracks'"),
            PitlaneError::ItemNotFound { .. } => {
                Some("Check the item name and that install_root points at the server installation")
            },
            PitlaneError::MetadataParse { .. } => Some("Fix the JSON syntax in the item's ui file"),
            PitlaneError::BuildFailed { .. } => {
                Some("Check that cache_root is writable and the item files are readable")
            },
            _ => None,
        }
    }
}
