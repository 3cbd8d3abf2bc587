use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::DatasetName;
use crate::error::FetchError;

/// Flat on-disk layout: one directory per dataset directly under the root.
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn dataset_dir(&self, name: &DatasetName) -> Utf8PathBuf {
        self.root.join(name.as_str())
    }

    pub fn ensure_root(&self) -> Result<(), FetchError> {
        fs::create_dir_all(self.root.as_std_path()).map_err(|err| {
            FetchError::Filesystem(format!("create download root {}: {err}", self.root))
        })
    }

    /// Creates the dataset directory. Never reuses an existing one.
    pub fn create_dataset_dir(&self, name: &DatasetName) -> Result<Utf8PathBuf, FetchError> {
        let dir = self.dataset_dir(name);
        match fs::create_dir(dir.as_std_path()) {
            Ok(()) => Ok(dir),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                Err(FetchError::DestinationExists(dir.into_std_path_buf()))
            }
            Err(err) => Err(FetchError::Filesystem(format!("create {dir}: {err}"))),
        }
    }
}
