//! Core data types for Pitlane.
//!
//! This module provides the fundamental types used throughout Pitlane:
//! - The content kind registry (cars, tracks)

pub mod kind;

// Re-export all public types
pub use kind::AssetKind;
