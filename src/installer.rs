use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::DatasetName;
use crate::error::FetchError;
use crate::fs_util::{self, ExtractSummary};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct InstalledDataset {
    pub destination: Utf8PathBuf,
    pub summary: ExtractSummary,
}

/// Creates `<root>/<name>`; fails if it is already there.
pub fn prepare_destination(store: &Store, name: &DatasetName) -> Result<Utf8PathBuf, FetchError> {
    let dir = store.create_dataset_dir(name)?;
    tracing::debug!(dataset = %name, path = %dir, "created destination");
    Ok(dir)
}

/// Extracts `bytes` into an already created destination. A payload that does not
/// open as a zip leaves the destination untouched; a failure part way through
/// leaves whatever was written so far.
pub fn extract_into(
    name: &DatasetName,
    bytes: &[u8],
    destination: &Utf8Path,
) -> Result<ExtractSummary, FetchError> {
    let mut archive =
        fs_util::open_zip_bytes(bytes).map_err(|err| FetchError::InvalidArchive {
            name: name.to_string(),
            message: err.to_string(),
        })?;
    let summary = fs_util::extract_zip_bytes(name, &mut archive, destination.as_std_path())?;
    tracing::info!(
        dataset = %name,
        files = summary.files,
        bytes = summary.bytes,
        "extracted archive"
    );
    Ok(summary)
}

pub fn install(
    store: &Store,
    name: &DatasetName,
    bytes: &[u8],
) -> Result<InstalledDataset, FetchError> {
    let destination = prepare_destination(store, name)?;
    let summary = extract_into(name, bytes, &destination)?;
    Ok(InstalledDataset {
        destination,
        summary,
    })
}
