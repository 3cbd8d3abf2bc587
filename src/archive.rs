use reqwest::blocking::Client;

use crate::config::PipelineConfig;
use crate::domain::DatasetName;
use crate::error::FetchError;
use crate::http;

/// Raw archive body together with the status it arrived with. The status is not
/// used to reject the payload; a non-zip body fails later, at extraction.
#[derive(Debug, Clone)]
pub struct ArchivePayload {
    pub status: u16,
    pub bytes: Vec<u8>,
}

impl ArchivePayload {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

pub trait ArchiveClient: Send + Sync {
    fn download(&self, name: &DatasetName, url: &str) -> Result<ArchivePayload, FetchError>;
}

#[derive(Clone)]
pub struct ArchiveHttpClient {
    client: Client,
    retries: usize,
}

impl ArchiveHttpClient {
    pub fn new(config: &PipelineConfig) -> Result<Self, FetchError> {
        let client = http::build_client(config.timeout).map_err(FetchError::HttpClient)?;
        Ok(Self {
            client,
            retries: config.retries,
        })
    }
}

impl ArchiveClient for ArchiveHttpClient {
    fn download(&self, name: &DatasetName, url: &str) -> Result<ArchivePayload, FetchError> {
        let to_error = |err: reqwest::Error| FetchError::ArchiveHttp {
            name: name.to_string(),
            message: err.to_string(),
        };
        let response = http::send_with_retries(self.retries, || self.client.get(url))
            .map_err(to_error)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().map_err(to_error)?;
        Ok(ArchivePayload {
            status,
            bytes: bytes.to_vec(),
        })
    }
}

/// Downloads the archive for `name` from the configured base URL.
pub fn fetch_archive<A: ArchiveClient + ?Sized>(
    config: &PipelineConfig,
    client: &A,
    name: &DatasetName,
) -> Result<ArchivePayload, FetchError> {
    let url = config.archive_url(name);
    tracing::debug!(dataset = %name, url = %url, "requesting archive");
    let payload = client.download(name, &url)?;
    if !payload.is_success() {
        tracing::warn!(
            dataset = %name,
            status = payload.status,
            "archive request returned a non-success status; passing payload through"
        );
    }
    tracing::debug!(dataset = %name, bytes = payload.len(), "archive received");
    Ok(payload)
}
