//! Archive cache store
//!
//! The cache is simply whatever `<category>/<name>.zip` files exist under the
//! cache root. There is no index and no expiry: a present archive is served
//! as-is until someone deletes it, and archives dropped in by an operator are
//! served the same way as ones built here.

use pitlane_core::AssetKind;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::debug;

/// Filesystem-backed archive cache
#[derive(Debug, Clone)]
pub struct ArchiveCache {
    /// Root directory for archives
    root_path: PathBuf,
}

impl ArchiveCache {
    /// Create a cache rooted at `root_path` (nothing is created on disk)
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    /// Deterministic location of an item's archive
    pub fn archive_path(&self, kind: AssetKind, name: &str) -> PathBuf {
        self.root_path
            .join(kind.category_key())
            .join(format!("{}.zip", name))
    }

    /// Check if an archive exists for the item
    pub fn contains(&self, kind: AssetKind, name: &str) -> bool {
        self.archive_path(kind, name).is_file()
    }

    /// Read a cached archive
    ///
    /// Absent and unreadable archives are both a miss.
    pub fn get(&self, kind: AssetKind, name: &str) -> Option<Vec<u8>> {
        let path = self.archive_path(kind, name);

        match fs::read(&path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "unreadable cached archive, treating as miss");
                None
            },
        }
    }
}
