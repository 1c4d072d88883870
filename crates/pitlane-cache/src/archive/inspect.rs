//! Reading back built archives

use pitlane_core::error::PitlaneError;
use std::io::{self, Cursor};
use zip::ZipArchive;

use crate::CacheResult;

/// List entry names of an in-memory archive, in archive order
pub fn list_entries(bytes: &[u8]) -> CacheResult<Vec<String>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(invalid_archive)?;

    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let file = archive.by_index(index).map_err(invalid_archive)?;
        names.push(file.name().to_string());
    }

    Ok(names)
}

fn invalid_archive(e: zip::result::ZipError) -> PitlaneError {
    PitlaneError::io(
        "Failed to read archive".to_string(),
        io::Error::new(io::ErrorKind::InvalidData, e),
    )
}
