use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::FetchError;

pub const ARCHIVE_EXTENSION: &str = ".zip";

/// Identifier of a clinical dataset, used both as the catalog key and as the
/// name of the directory it is unpacked into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetName(String);

impl DatasetName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn archive_filename(&self) -> String {
        format!("{}{ARCHIVE_EXTENSION}", self.0)
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatasetName {
    type Err = FetchError;

    /// Names are taken literally; surrounding whitespace is rejected, not trimmed.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let is_valid = !value.is_empty()
            && value.trim() == value
            && value != "."
            && value != ".."
            && !value.contains(['/', '\\', '\0']);
        if !is_valid {
            return Err(FetchError::InvalidDatasetName(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }
}

impl TryFrom<String> for DatasetName {
    type Error = FetchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// How far a single dataset got through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetStage {
    Pending,
    DirectoryCreated,
    Fetched,
    Extracted,
    Done,
}

impl fmt::Display for DatasetStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetStage::Pending => write!(f, "pending"),
            DatasetStage::DirectoryCreated => write!(f, "directory_created"),
            DatasetStage::Fetched => write!(f, "fetched"),
            DatasetStage::Extracted => write!(f, "extracted"),
            DatasetStage::Done => write!(f, "done"),
        }
    }
}
