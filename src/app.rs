use std::time::{Duration, Instant};

use serde::Serialize;

use crate::archive::{self, ArchiveClient};
use crate::catalog::{self, CatalogClient, NameCandidate, RejectedName};
use crate::config::{FailurePolicy, PipelineConfig};
use crate::domain::{DatasetName, DatasetStage};
use crate::error::FetchError;
use crate::installer;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NameSource {
    Static,
    Catalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Installed,
    Failed,
    Planned,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: String,
    pub finished_at: String,
    pub download_dir: String,
    pub source: NameSource,
    pub items: Vec<DatasetOutcome>,
}

impl RunReport {
    pub fn installed(&self) -> usize {
        self.count(OutcomeStatus::Installed)
    }

    pub fn failed(&self) -> usize {
        self.count(OutcomeStatus::Failed)
    }

    fn count(&self, status: OutcomeStatus) -> usize {
        self.items.iter().filter(|item| item.status == status).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetOutcome {
    pub name: String,
    pub archive_url: String,
    pub destination: String,
    pub status: OutcomeStatus,
    pub stage: DatasetStage,
    pub http_status: Option<u16>,
    pub payload_bytes: Option<u64>,
    pub files: Option<usize>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    fn phase(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            elapsed: None,
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct App<C: CatalogClient, A: ArchiveClient> {
    catalog: C,
    archives: A,
}

impl<C: CatalogClient, A: ArchiveClient> App<C, A> {
    pub fn new(catalog: C, archives: A) -> Self {
        Self { catalog, archives }
    }

    /// Resolves the dataset list and installs each dataset in order.
    ///
    /// Under [`FailurePolicy::Abort`] the first failing dataset ends the run with
    /// its error. Under [`FailurePolicy::Continue`] the failure is recorded in the
    /// report and the remaining datasets are still processed.
    pub fn run(
        &self,
        config: &PipelineConfig,
        sink: &dyn ProgressSink,
    ) -> Result<RunReport, FetchError> {
        let started_at = iso_timestamp();
        let source = if config.uses_catalog() {
            NameSource::Catalog
        } else {
            NameSource::Static
        };

        sink.event(ProgressEvent::phase(match source {
            NameSource::Catalog => format!("phase=Resolve; querying {}", config.catalog_url),
            NameSource::Static => "phase=Resolve; using static dataset list".to_string(),
        }));
        let candidates: Vec<NameCandidate> = match config.failure_policy {
            FailurePolicy::Abort => catalog::resolve_dataset_names(config, &self.catalog)?
                .into_iter()
                .map(Ok)
                .collect(),
            FailurePolicy::Continue => catalog::resolve_candidates(config, &self.catalog)?,
        };
        tracing::info!(count = candidates.len(), ?source, "resolved datasets");

        let store = Store::new(config.download_dir.clone());
        let mut items = Vec::with_capacity(candidates.len());

        if config.dry_run {
            for candidate in &candidates {
                items.push(match candidate {
                    Ok(name) => pending_outcome(config, &store, name, OutcomeStatus::Planned),
                    Err(rejected) => rejected_outcome(rejected),
                });
            }
        } else {
            store.ensure_root()?;
            for (index, candidate) in candidates.iter().enumerate() {
                let name = match candidate {
                    Ok(name) => name,
                    Err(rejected) => {
                        tracing::warn!(name = ?rejected.0, "dataset name rejected; continuing");
                        items.push(rejected_outcome(rejected));
                        continue;
                    }
                };
                sink.event(ProgressEvent::phase(format!(
                    "dataset {}/{}: {name}",
                    index + 1,
                    candidates.len()
                )));
                let mut outcome = pending_outcome(config, &store, name, OutcomeStatus::Failed);
                match self.install_single(config, &store, name, &mut outcome, sink) {
                    Ok(()) => {
                        outcome.status = OutcomeStatus::Installed;
                        outcome.stage = DatasetStage::Done;
                        items.push(outcome);
                    }
                    Err(err) => match config.failure_policy {
                        FailurePolicy::Abort => return Err(err),
                        FailurePolicy::Continue => {
                            tracing::warn!(
                                dataset = %name,
                                stage = %outcome.stage,
                                error = %err,
                                "dataset failed; continuing"
                            );
                            outcome.status = OutcomeStatus::Failed;
                            outcome.error = Some(err.to_string());
                            items.push(outcome);
                        }
                    },
                }
            }
        }

        Ok(RunReport {
            started_at,
            finished_at: iso_timestamp(),
            download_dir: store.root().to_string(),
            source,
            items,
        })
    }

    fn install_single(
        &self,
        config: &PipelineConfig,
        store: &Store,
        name: &DatasetName,
        outcome: &mut DatasetOutcome,
        sink: &dyn ProgressSink,
    ) -> Result<(), FetchError> {
        let destination = installer::prepare_destination(store, name)?;
        outcome.stage = DatasetStage::DirectoryCreated;

        sink.event(ProgressEvent::phase(format!(
            "phase=Fetch; {}",
            name.archive_filename()
        )));
        let start = Instant::now();
        let payload = archive::fetch_archive(config, &self.archives, name)?;
        let latency = start.elapsed();
        sink.event(ProgressEvent {
            message: format!(
                "archive.response status={} bytes={} latency_ms={}",
                payload.status,
                payload.len(),
                latency.as_millis()
            ),
            elapsed: Some(latency),
        });
        outcome.stage = DatasetStage::Fetched;
        outcome.http_status = Some(payload.status);
        outcome.payload_bytes = Some(payload.len() as u64);

        sink.event(ProgressEvent::phase(format!("phase=Extract; {destination}")));
        let summary = installer::extract_into(name, &payload.bytes, &destination)?;
        outcome.stage = DatasetStage::Extracted;
        outcome.files = Some(summary.files);
        Ok(())
    }
}

fn pending_outcome(
    config: &PipelineConfig,
    store: &Store,
    name: &DatasetName,
    status: OutcomeStatus,
) -> DatasetOutcome {
    DatasetOutcome {
        name: name.to_string(),
        archive_url: config.archive_url(name),
        destination: store.dataset_dir(name).to_string(),
        status,
        stage: DatasetStage::Pending,
        http_status: None,
        payload_bytes: None,
        files: None,
        error: None,
    }
}

/// A catalog name that never became a dataset: it has no URL or destination.
fn rejected_outcome(rejected: &RejectedName) -> DatasetOutcome {
    DatasetOutcome {
        name: rejected.0.clone(),
        archive_url: String::new(),
        destination: String::new(),
        status: OutcomeStatus::Failed,
        stage: DatasetStage::Pending,
        http_status: None,
        payload_bytes: None,
        files: None,
        error: Some(rejected.clone().into_error().to_string()),
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
