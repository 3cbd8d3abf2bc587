use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use zip::ZipArchive;

use crate::domain::DatasetName;
use crate::error::FetchError;

/// What was written by [`extract_zip_bytes`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

pub fn open_zip_bytes(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, zip::result::ZipError> {
    ZipArchive::new(Cursor::new(bytes))
}

/// Unpacks an in-memory zip archive below `target_dir`, keeping the relative
/// paths stored in the archive. `target_dir` must already exist.
///
/// Each entry is read fully before its file is created, so a corrupt entry
/// (bad checksum, broken compressed stream) is reported as
/// [`FetchError::InvalidArchive`] and only write failures as
/// [`FetchError::Filesystem`].
pub fn extract_zip_bytes(
    name: &DatasetName,
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    target_dir: &Path,
) -> Result<ExtractSummary, FetchError> {
    let corrupt = |message: String| FetchError::InvalidArchive {
        name: name.to_string(),
        message,
    };
    let mut summary = ExtractSummary::default();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| corrupt(format!("zip entry {i}: {err}")))?;
        let entry_path = match entry.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => return Err(FetchError::UnsafeArchiveEntry(entry.name().to_string())),
        };

        if entry.is_dir() {
            fs::create_dir_all(&entry_path)
                .map_err(|err| FetchError::Filesystem(err.to_string()))?;
            summary.directories += 1;
            continue;
        }

        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|err| corrupt(format!("zip entry {}: {err}", entry.name())))?;

        if let Some(parent) = entry_path.parent() {
            fs::create_dir_all(parent).map_err(|err| FetchError::Filesystem(err.to_string()))?;
        }
        fs::write(&entry_path, &contents).map_err(|err| {
            FetchError::Filesystem(format!("write {}: {err}", entry_path.display()))
        })?;
        summary.files += 1;
        summary.bytes += contents.len() as u64;
    }
    Ok(summary)
}
