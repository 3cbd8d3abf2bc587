use std::time::Duration;

use camino::Utf8PathBuf;

use crate::domain::DatasetName;
use crate::error::FetchError;

pub const DEFAULT_ARCHIVE_BASE_URL: &str = "https://zenodo.org/record/7199344/files/";
pub const DEFAULT_CATALOG_URL: &str = "https://www.orcestra.ca/api/clinical_icb/canonical";
pub const DEFAULT_DOWNLOAD_DIR: &str = ".local_data";
pub const DOWNLOAD_QUERY_SUFFIX: &str = "?=download=1";

/// Datasets hosted on Zenodo that the canonical catalog does not list.
pub fn default_extra_names() -> Vec<String> {
    vec!["ICB_Fumet1".to_string(), "ICB_Fumet2".to_string()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the run on the first failing dataset.
    #[default]
    Abort,
    /// Record the failure and move on to the next dataset.
    Continue,
}

/// Unvalidated run parameters, as collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    pub archive_base_url: Option<String>,
    pub catalog_url: Option<String>,
    pub studies: Vec<String>,
    pub extras: Option<Vec<String>>,
    pub download_dir: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retries: usize,
    pub failure_policy: FailurePolicy,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub archive_base_url: String,
    pub catalog_url: String,
    /// Empty means "ask the catalog".
    pub studies: Vec<DatasetName>,
    /// Appended after catalog-derived names; ignored for a static list.
    pub extras: Vec<DatasetName>,
    pub download_dir: Utf8PathBuf,
    pub timeout: Option<Duration>,
    pub retries: usize,
    pub failure_policy: FailurePolicy,
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let extras = default_extra_names()
            .into_iter()
            .map(DatasetName::try_from)
            .collect::<Result<Vec<_>, _>>()
            .unwrap_or_default();
        Self {
            archive_base_url: DEFAULT_ARCHIVE_BASE_URL.to_string(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            studies: Vec::new(),
            extras,
            download_dir: Utf8PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            timeout: None,
            retries: 0,
            failure_policy: FailurePolicy::Abort,
            dry_run: false,
        }
    }
}

impl PipelineConfig {
    /// Full archive URL for a dataset: base, one separator, file name, query suffix.
    pub fn archive_url(&self, name: &DatasetName) -> String {
        let base = self.archive_base_url.trim_end_matches('/');
        format!("{base}/{}{DOWNLOAD_QUERY_SUFFIX}", name.archive_filename())
    }

    pub fn uses_catalog(&self) -> bool {
        self.studies.is_empty()
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve_settings(settings: RunSettings) -> Result<PipelineConfig, FetchError> {
        let defaults = PipelineConfig::default();

        let studies = parse_names(settings.studies)?;
        let extras = match settings.extras {
            Some(extras) => parse_names(extras)?,
            None => defaults.extras,
        };

        Ok(PipelineConfig {
            archive_base_url: settings
                .archive_base_url
                .unwrap_or(defaults.archive_base_url),
            catalog_url: settings.catalog_url.unwrap_or(defaults.catalog_url),
            studies,
            extras,
            download_dir: settings
                .download_dir
                .map(Utf8PathBuf::from)
                .unwrap_or(defaults.download_dir),
            timeout: settings.timeout_secs.map(Duration::from_secs),
            retries: settings.retries,
            failure_policy: settings.failure_policy,
            dry_run: settings.dry_run,
        })
    }
}

fn parse_names(raw: Vec<String>) -> Result<Vec<DatasetName>, FetchError> {
    raw.into_iter()
        .map(|value| value.parse())
        .collect::<Result<Vec<_>, FetchError>>()
}
