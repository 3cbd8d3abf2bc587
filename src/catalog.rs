use std::collections::HashSet;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::domain::DatasetName;
use crate::error::FetchError;
use crate::http;

/// One record of the ORCESTRA canonical listing. Only `name` is consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
}

pub trait CatalogClient: Send + Sync {
    fn list_entries(&self, url: &str) -> Result<Vec<CatalogEntry>, FetchError>;
}

#[derive(Clone)]
pub struct CatalogHttpClient {
    client: Client,
    retries: usize,
}

impl CatalogHttpClient {
    pub fn new(config: &PipelineConfig) -> Result<Self, FetchError> {
        let client = http::build_client(config.timeout).map_err(FetchError::HttpClient)?;
        Ok(Self {
            client,
            retries: config.retries,
        })
    }
}

impl CatalogClient for CatalogHttpClient {
    fn list_entries(&self, url: &str) -> Result<Vec<CatalogEntry>, FetchError> {
        tracing::debug!(url, "requesting catalog");
        let response = http::send_with_retries(self.retries, || self.client.get(url))
            .map_err(|err| FetchError::CatalogHttp(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| FetchError::CatalogHttp(err.to_string()))?;
        parse_catalog(&body)
            .map_err(|err| FetchError::CatalogParse(format!("status {status}: {err}")))
    }
}

pub fn parse_catalog(body: &str) -> Result<Vec<CatalogEntry>, serde_json::Error> {
    serde_json::from_str(body)
}

/// A catalog `name` that cannot be used as a dataset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedName(pub String);

impl RejectedName {
    pub fn into_error(self) -> FetchError {
        FetchError::InvalidDatasetName(self.0)
    }
}

pub type NameCandidate = Result<DatasetName, RejectedName>;

/// Produces the ordered list of datasets to fetch. A non-empty static list wins,
/// is returned exactly as configured and never touches the network; otherwise
/// the catalog is queried and the configured extras are appended.
pub fn resolve_dataset_names<C: CatalogClient + ?Sized>(
    config: &PipelineConfig,
    catalog: &C,
) -> Result<Vec<DatasetName>, FetchError> {
    resolve_candidates(config, catalog)?
        .into_iter()
        .map(|candidate| candidate.map_err(RejectedName::into_error))
        .collect()
}

/// Like [`resolve_dataset_names`], but catalog names that fail validation are
/// kept in place as [`RejectedName`]s instead of failing the whole listing.
pub fn resolve_candidates<C: CatalogClient + ?Sized>(
    config: &PipelineConfig,
    catalog: &C,
) -> Result<Vec<NameCandidate>, FetchError> {
    if !config.uses_catalog() {
        return Ok(config.studies.iter().cloned().map(Ok).collect());
    }

    let entries = catalog.list_entries(&config.catalog_url)?;
    tracing::info!(count = entries.len(), "catalog listed datasets");
    let from_catalog = entries.into_iter().map(|entry| {
        entry.name.parse::<DatasetName>().map_err(|_| {
            tracing::warn!(name = ?entry.name, "catalog lists an unusable dataset name");
            RejectedName(entry.name)
        })
    });

    Ok(dedup_candidates(
        from_catalog.chain(config.extras.iter().cloned().map(Ok)),
    ))
}

fn dedup_candidates(candidates: impl IntoIterator<Item = NameCandidate>) -> Vec<NameCandidate> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for candidate in candidates {
        if let Ok(name) = &candidate
            && !seen.insert(name.clone())
        {
            tracing::warn!(dataset = %name, "skipping duplicate dataset name");
            continue;
        }
        ordered.push(candidate);
    }
    ordered
}
