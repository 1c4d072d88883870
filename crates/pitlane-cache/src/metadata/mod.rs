//! Download URL injection into item metadata
//!
//! Every item carries a JSON ui file (`ui/ui_car.json`, `ui/meta_data.json`).
//! The desktop installer reads its `downloadURL` field to fetch the item, so
//! at startup each ui file is patched to point at this server's download
//! route. Items by blacklisted authors are left alone, and existing URLs are
//! only replaced when overwriting is enabled.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use pitlane_core::error::PitlaneError;
use pitlane_core::AssetKind;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use url::Url;

use crate::CacheResult;

/// Metadata key holding the author name
pub const AUTHOR_KEY: &str = "author";

/// Metadata key holding the download URL
pub const DOWNLOAD_URL_KEY: &str = "downloadURL";

/// Route segment the HTTP server serves archives under
pub const DOWNLOAD_ROUTE: &str = "download";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Bytes escaped in the item name segment; non-ASCII is always escaped
const ITEM_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// What `rewrite_one` did to an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// The download URL was written
    Updated,
    /// The author is blacklisted, file untouched
    SkippedBlacklisted,
    /// A download URL was already set and overwriting is off
    SkippedExisting,
}

/// Summary of a rewrite pass
#[derive(Debug, Default)]
pub struct RewriteReport {
    pub updated: usize,
    pub blacklisted: usize,
    pub existing: usize,
    pub errors: Vec<PitlaneError>,
}

impl RewriteReport {
    fn record(&mut self, outcome: RewriteOutcome) {
        match outcome {
            RewriteOutcome::Updated => self.updated += 1,
            RewriteOutcome::SkippedBlacklisted => self.blacklisted += 1,
            RewriteOutcome::SkippedExisting => self.existing += 1,
        }
    }

    /// Number of items processed without error
    pub fn processed(&self) -> usize {
        self.updated + self.blacklisted + self.existing
    }
}

/// Patches item metadata documents with download URLs
#[derive(Debug, Clone)]
pub struct MetadataInjector {
    base_url: Url,
    authors_blacklist: Vec<String>,
    overwrite: bool,
}

impl MetadataInjector {
    /// Create an injector
    ///
    /// `base_url` must be able to carry path segments (any http/https URL can).
    pub fn new(base_url: Url, authors_blacklist: Vec<String>, overwrite: bool) -> CacheResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(PitlaneError::ConfigValidation {
                field: "urls.base_domain".to_string(),
                reason: format!("'{}' cannot carry a download path", base_url),
            });
        }

        Ok(Self {
            base_url,
            authors_blacklist,
            overwrite,
        })
    }

    /// Returns true if an author has been blacklisted
    pub fn is_author_blacklisted(&self, author: &str) -> bool {
        self.authors_blacklist.iter().any(|b| b == author)
    }

    /// Download URL for an item, with the name encoded as one path segment
    ///
    /// The name is escaped here rather than by `url`, whose parser strips
    /// tabs and newlines from input.
    pub fn download_url(&self, kind: AssetKind, name: &str) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend([DOWNLOAD_ROUTE, kind.category_key()]);
        }
        let path = format!("{}/{}", url.path(), utf8_percent_encode(name, ITEM_SEGMENT));
        url.set_path(&path);
        url.into()
    }

    /// Patch the metadata document of a single item directory
    pub fn rewrite_one(&self, item_dir: &Path, kind: AssetKind) -> CacheResult<RewriteOutcome> {
        let path = item_dir.join(kind.metadata_rel_path());
        let name = item_dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PitlaneError::InvalidItemName {
                name: item_dir.display().to_string(),
                reason: "item directory name is not valid UTF-8".to_string(),
            })?;

        let raw = fs::read(&path).map_err(|source| PitlaneError::MetadataRead {
            path: path.clone(),
            source,
        })?;
        let body = raw.strip_prefix(UTF8_BOM).unwrap_or(&raw[..]);

        let mut document: Map<String, Value> =
            serde_json::from_slice(body).map_err(|e| PitlaneError::MetadataParse {
                path: path.clone(),
                message: e.to_string(),
            })?;

        if let Some(author) = author_of(&document) {
            if self.is_author_blacklisted(&author) {
                debug!(kind = %kind, name, author = %author, "author blacklisted, skipping");
                return Ok(RewriteOutcome::SkippedBlacklisted);
            }
        }

        if !self.overwrite && has_download_url(&document) {
            debug!(kind = %kind, name, "download URL already set, skipping");
            return Ok(RewriteOutcome::SkippedExisting);
        }

        let url = self.download_url(kind, name);
        debug!(kind = %kind, name, url = %url, "set download URL");
        document.insert(DOWNLOAD_URL_KEY.to_string(), Value::String(url));

        let updated = serde_json::to_vec_pretty(&document).map_err(|e| {
            PitlaneError::MetadataWrite {
                path: path.clone(),
                source: io::Error::new(io::ErrorKind::InvalidData, e),
            }
        })?;

        replace_file(&path, &updated).map_err(|source| PitlaneError::MetadataWrite {
            path: path.clone(),
            source,
        })?;

        Ok(RewriteOutcome::Updated)
    }

    /// Patch every item of one kind, collecting failures
    pub fn rewrite_all(&self, install_root: &Path, kind: AssetKind) -> Vec<PitlaneError> {
        let mut report = RewriteReport::default();
        self.rewrite_kind(install_root, kind, &mut report);
        report.errors
    }

    /// Patch every item of every known kind
    pub fn rewrite_every_kind(&self, install_root: &Path) -> RewriteReport {
        let mut report = RewriteReport::default();

        for kind in AssetKind::ALL {
            debug!(kind = %kind, "set download URLs");
            self.rewrite_kind(install_root, kind, &mut report);
        }

        for error in &report.errors {
            warn!(error = %error, "metadata rewrite failed");
        }

        report
    }

    fn rewrite_kind(&self, install_root: &Path, kind: AssetKind, report: &mut RewriteReport) {
        let content_dir = kind.content_dir(install_root);

        let entries = match fs::read_dir(&content_dir) {
            Ok(entries) => entries,
            Err(e) => {
                report.errors.push(PitlaneError::io(
                    format!("Failed to list {}", content_dir.display()),
                    e,
                ));
                return;
            },
        };

        let mut item_dirs = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) if entry.path().is_dir() => item_dirs.push(entry.path()),
                Ok(entry) => debug!(path = %entry.path().display(), "not an item directory, skipping"),
                Err(e) => report.errors.push(PitlaneError::io(
                    format!("Failed to list {}", content_dir.display()),
                    e,
                )),
            }
        }
        item_dirs.sort();

        for item_dir in item_dirs {
            match self.rewrite_one(&item_dir, kind) {
                Ok(outcome) => report.record(outcome),
                Err(e) => report.errors.push(e),
            }
        }
    }
}

/// Author coerced to a string; absent and null mean no author
fn author_of(document: &Map<String, Value>) -> Option<String> {
    match document.get(AUTHOR_KEY)? {
        Value::Null => None,
        Value::String(author) => Some(author.clone()),
        other => Some(other.to_string()),
    }
}

fn has_download_url(document: &Map<String, Value>) -> bool {
    matches!(document.get(DOWNLOAD_URL_KEY), Some(Value::String(url)) if !url.is_empty())
}

/// Replace a file's contents through a sibling temporary file, keeping its permissions
fn replace_file(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    let permissions = fs::metadata(path)?.permissions();

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    fs::set_permissions(temp.path(), permissions)?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests;
