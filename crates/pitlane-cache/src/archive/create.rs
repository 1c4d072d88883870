//! Archive creation
//!
//! Builds `cache_root/<category>/<name>.zip` from
//! `install_root/<content_root>/<name>/`. Entry names are taken relative to
//! the content root, so every entry starts with `<name>/`.

use chrono::{DateTime, Datelike, Local, Timelike};
use pitlane_core::error::PitlaneError;
use pitlane_core::utils::to_archive_path;
use pitlane_core::AssetKind;
use std::fs::{self, File, Metadata};
use std::io::{self, Seek, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::CacheResult;

/// A file scheduled for archiving
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    /// Absolute path of the file on disk
    pub source: PathBuf,
    /// Entry name inside the archive, `/` separated
    pub archive_path: String,
}

/// Ordered list of files making up one archive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchivePlan {
    pub entries: Vec<PlannedEntry>,
}

impl ArchivePlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Packages item directories into installer-ready zip archives
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    install_root: PathBuf,
    cache_root: PathBuf,
}

impl ArchiveBuilder {
    /// Create a builder reading from `install_root` and writing under `cache_root`
    pub fn new(install_root: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            cache_root: cache_root.into(),
        }
    }

    /// Cache root made absolute against the current working directory
    pub fn resolved_cache_root(&self) -> io::Result<PathBuf> {
        if self.cache_root.is_absolute() {
            Ok(self.cache_root.clone())
        } else {
            Ok(std::env::current_dir()?.join(&self.cache_root))
        }
    }

    /// Collect every regular file of an item with its remapped archive path
    pub fn plan(&self, kind: AssetKind, name: &str) -> CacheResult<ArchivePlan> {
        let content_dir = kind.content_dir(&self.install_root);
        let item_dir = content_dir.join(name);
        let mut plan = ArchivePlan::default();

        for entry in WalkDir::new(&item_dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                PitlaneError::build_failed(
                    kind,
                    name,
                    format!("Failed to walk {}", item_dir.display()),
                    e,
                )
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let archive_path = entry
                .path()
                .strip_prefix(&content_dir)
                .ok()
                .and_then(to_archive_path)
                .ok_or_else(|| PitlaneError::BuildFailed {
                    kind,
                    name: name.to_string(),
                    message: format!(
                        "Cannot map {} to an archive path",
                        entry.path().display()
                    ),
                    source: None,
                })?;

            plan.entries.push(PlannedEntry {
                source: entry.path().to_path_buf(),
                archive_path,
            });
        }

        Ok(plan)
    }

    /// Build the archive for an item and move it into the cache
    ///
    /// The archive is written to a temporary file next to its destination and
    /// renamed into place only once complete. Returns the final path.
    pub fn build(&self, kind: AssetKind, name: &str) -> CacheResult<PathBuf> {
        let fail = |message: String, e: io::Error| PitlaneError::build_failed(kind, name, message, e);

        let cache_root = self
            .resolved_cache_root()
            .map_err(|e| fail("Failed to resolve cache root".to_string(), e))?;
        let category_dir = cache_root.join(kind.category_key());

        // Make sure the category directory exists
        fs::create_dir_all(&category_dir)
            .map_err(|e| fail(format!("Failed to create {}", category_dir.display()), e))?;

        let plan = self.plan(kind, name)?;
        let destination = category_dir.join(format!("{}.zip", name));

        let mut temp = NamedTempFile::new_in(&category_dir)
            .map_err(|e| fail("Failed to create temporary archive".to_string(), e))?;

        write_archive(temp.as_file_mut(), &plan).map_err(|e| match e {
            WriteError::Io(message, e) => fail(message, e),
            WriteError::Zip(e) => PitlaneError::build_failed(
                kind,
                name,
                "Failed to write zip archive".to_string(),
                e,
            ),
        })?;

        temp.as_file()
            .sync_all()
            .map_err(|e| fail("Failed to flush archive".to_string(), e))?;

        temp.persist(&destination).map_err(|e| {
            PitlaneError::build_failed(
                kind,
                name,
                format!("Failed to move archive to {}", destination.display()),
                e,
            )
        })?;

        info!(
            kind = %kind,
            name,
            files = plan.len(),
            path = %destination.display(),
            "built archive"
        );

        Ok(destination)
    }
}

enum WriteError {
    Io(String, io::Error),
    Zip(zip::result::ZipError),
}

impl From<zip::result::ZipError> for WriteError {
    fn from(e: zip::result::ZipError) -> Self {
        WriteError::Zip(e)
    }
}

/// Stream every planned file into a Deflate-compressed zip
fn write_archive<W: Write + Seek>(writer: W, plan: &ArchivePlan) -> Result<(), WriteError> {
    let mut zip = ZipWriter::new(writer);

    for entry in &plan.entries {
        let mut source = File::open(&entry.source).map_err(|e| {
            WriteError::Io(format!("Failed to open {}", entry.source.display()), e)
        })?;
        let metadata = source.metadata().map_err(|e| {
            WriteError::Io(format!("Failed to stat {}", entry.source.display()), e)
        })?;

        debug!(
            file_path = %entry.source.display(),
            archive_path = %entry.archive_path,
            "add file to archive"
        );

        zip.start_file(entry.archive_path.as_str(), entry_options(&metadata))?;
        io::copy(&mut source, &mut zip).map_err(|e| {
            WriteError::Io(format!("Failed to archive {}", entry.source.display()), e)
        })?;
    }

    zip.finish()?;
    Ok(())
}

/// Compression and file attributes for one entry
fn entry_options(metadata: &Metadata) -> SimpleFileOptions {
    let mut options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(metadata.len() >= u32::MAX as u64);

    if let Some(modified) = zip_timestamp(metadata) {
        options = options.last_modified_time(modified);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        options = options.unix_permissions(metadata.permissions().mode());
    }

    options
}

/// Modification time in the zip date range (1980-2107), if representable
fn zip_timestamp(metadata: &Metadata) -> Option<zip::DateTime> {
    let modified: DateTime<Local> = metadata.modified().ok()?.into();
    let year = u16::try_from(modified.year()).ok()?;

    zip::DateTime::from_date_and_time(
        year,
        modified.month() as u8,
        modified.day() as u8,
        modified.hour() as u8,
        modified.minute() as u8,
        modified.second() as u8,
    )
    .ok()
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use proptest::test_runner::Config as ProptestConfig;
    use std::collections::HashMap;
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    // Strategy for generating file structures
    fn file_structure_strategy() -> impl Strategy<Value = HashMap<String, Vec<u8>>> {
        prop::collection::hash_map(
            // File paths (no directory traversal)
            "[a-zA-Z0-9_-]+(/[a-zA-Z0-9_-]+){0,3}\\.[a-z]{1,4}",
            prop::collection::vec(any::<u8>(), 0..1000),
            0..10,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]
        /// Every file of the item appears once at `<name>/<relative path>`
        #[test]
        fn archive_reproduces_item_tree(files in file_structure_strategy()) {
            let temp_dir = tempdir().unwrap();
            let install_root = temp_dir.path().join("server");
            let cache_root = temp_dir.path().join("cache");
            let item_dir = AssetKind::Car.item_dir(&install_root, "prop_car");
            fs::create_dir_all(&item_dir).unwrap();

            // Generated paths may collide as file and directory, keep what fits
            let mut written = HashMap::new();
            for (file_path, content) in &files {
                let full_path = item_dir.join(file_path);
                if let Some(parent) = full_path.parent() {
                    if fs::create_dir_all(parent).is_err() {
                        continue;
                    }
                }
                if full_path.is_dir() || fs::write(&full_path, content).is_err() {
                    continue;
                }
                written.insert(format!("prop_car/{}", file_path), content.clone());
            }

            let builder = ArchiveBuilder::new(&install_root, &cache_root);
            let path = builder.build(AssetKind::Car, "prop_car").unwrap();

            let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
            prop_assert_eq!(archive.len(), written.len());

            for (name, expected) in &written {
                let mut entry = archive.by_name(name).unwrap();
                let mut actual = Vec::new();
                entry.read_to_end(&mut actual).unwrap();
                prop_assert_eq!(&actual, expected, "Content mismatch for {}", name);
            }
        }
    }
}
