//! Content kind registry.
//!
//! Each kind knows its category key (used for cache namespacing and download
//! URLs), the folder holding all of its items relative to the server
//! installation, and where an item keeps its JSON metadata.

use crate::error::PitlaneError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A kind of installable content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    /// Car mods under `content/cars`
    Car,
    /// Track mods under `content/tracks`
    Track,
}

impl AssetKind {
    /// Every known kind, in startup processing order
    pub const ALL: [AssetKind; 2] = [AssetKind::Car, AssetKind::Track];

    /// Stable slug used for cache namespacing and URL building
    pub fn category_key(&self) -> &'static str {
        match self {
            AssetKind::Car => "cars",
            AssetKind::Track => "tracks",
        }
    }

    /// Folder containing every item of this kind, relative to the install root
    pub fn content_root(&self) -> &'static str {
        match self {
            AssetKind::Car => "content/cars",
            AssetKind::Track => "content/tracks",
        }
    }

    /// Metadata document path relative to an item's own directory
    pub fn metadata_rel_path(&self) -> &'static str {
        match self {
            AssetKind::Car => "ui/ui_car.json",
            AssetKind::Track => "ui/meta_data.json",
        }
    }

    /// Absolute folder holding all items of this kind
    pub fn content_dir(&self, install_root: &Path) -> PathBuf {
        install_root.join(self.content_root())
    }

    /// Directory of a single item
    pub fn item_dir(&self, install_root: &Path, name: &str) -> PathBuf {
        self.content_dir(install_root).join(name)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category_key())
    }
}

impl FromStr for AssetKind {
    type Err = PitlaneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetKind::ALL
            .into_iter()
            .find(|kind| kind.category_key() == s)
            .ok_or_else(|| PitlaneError::UnknownKind {
                token: s.to_string(),
            })
    }
}
