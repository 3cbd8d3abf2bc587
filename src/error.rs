use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("invalid dataset name: {0:?}")]
    #[diagnostic(help("dataset names become directory names and cannot contain path separators"))]
    InvalidDatasetName(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("catalog request failed: {0}")]
    CatalogHttp(String),

    #[error("failed to parse catalog response: {0}")]
    CatalogParse(String),

    #[error("archive request for {name} failed: {message}")]
    ArchiveHttp { name: String, message: String },

    #[error("destination directory already exists: {}", .0.display())]
    #[diagnostic(help("remove the directory or choose another --dest to fetch this dataset again"))]
    DestinationExists(PathBuf),

    #[error("payload for {name} is not a valid zip archive: {message}")]
    InvalidArchive { name: String, message: String },

    #[error("zip entry escapes the destination directory: {0}")]
    UnsafeArchiveEntry(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
