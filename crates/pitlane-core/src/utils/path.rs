//! Path utilities for safe file system operations.
//!
//! Item names arrive from URL path segments, so they are checked to be a single
//! normal path component before being joined onto a content root.

use crate::error::{PitlaneError, PitlaneResult};
use std::path::{Component, Path};

/// Suffix carried by download URLs and cached archives
pub const ARCHIVE_SUFFIX: &str = ".zip";

/// Check if an item name is safe to join onto a content root
pub fn is_safe_item_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return false;
    }

    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Validate an item name, explaining why it was rejected
pub fn validate_item_name(name: &str) -> PitlaneResult<()> {
    if name.is_empty() {
        return Err(PitlaneError::InvalidItemName {
            name: name.to_string(),
            reason: "name is empty".to_string(),
        });
    }

    if !is_safe_item_name(name) {
        return Err(PitlaneError::InvalidItemName {
            name: name.to_string(),
            reason: "name must be a single directory name".to_string(),
        });
    }

    Ok(())
}

/// Strip one trailing `.zip` from a requested item name
pub fn strip_archive_suffix(name: &str) -> &str {
    name.strip_suffix(ARCHIVE_SUFFIX).unwrap_or(name)
}

/// Join relative path components with `/`, the separator archives use
pub fn to_archive_path(path: &Path) -> Option<String> {
    let mut parts = Vec::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {},
            _ => return None,
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
