//! # pitlane-core
//!
//! Core types and utilities shared across all Pitlane crates.
//!
//! This crate provides:
//! - The `AssetKind` registry describing where each content kind lives
//! - `PitlaneError` enum for unified error handling
//! - Path helpers that keep item names inside their content root
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (AssetKind)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{PitlaneError, PitlaneResult};
pub use types::AssetKind;
