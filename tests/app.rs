use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Write};
use std::sync::Mutex;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use zip::write::SimpleFileOptions;

use icb_data_fetch::app::{App, OutcomeStatus};
use icb_data_fetch::archive::{ArchiveClient, ArchivePayload};
use icb_data_fetch::catalog::{CatalogClient, CatalogEntry};
use icb_data_fetch::config::{FailurePolicy, PipelineConfig};
use icb_data_fetch::domain::{DatasetName, DatasetStage};
use icb_data_fetch::error::FetchError;
use icb_data_fetch::output::JsonOutput;

struct UnreachableCatalog;

impl CatalogClient for UnreachableCatalog {
    fn list_entries(&self, _url: &str) -> Result<Vec<CatalogEntry>, FetchError> {
        panic!("static dataset lists must not query the catalog");
    }
}

struct ListedCatalog(Vec<&'static str>);

impl CatalogClient for ListedCatalog {
    fn list_entries(&self, _url: &str) -> Result<Vec<CatalogEntry>, FetchError> {
        Ok(self
            .0
            .iter()
            .map(|name| CatalogEntry {
                name: name.to_string(),
            })
            .collect())
    }
}

#[derive(Default)]
struct MockArchives {
    payloads: HashMap<String, Vec<u8>>,
    requested: Mutex<Vec<String>>,
}

impl MockArchives {
    fn with(mut self, name: &str, payload: Vec<u8>) -> Self {
        self.payloads.insert(name.to_string(), payload);
        self
    }
}

impl ArchiveClient for MockArchives {
    fn download(&self, name: &DatasetName, url: &str) -> Result<ArchivePayload, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.payloads.get(name.as_str()) {
            Some(bytes) => Ok(ArchivePayload {
                status: 200,
                bytes: bytes.clone(),
            }),
            None => Err(FetchError::ArchiveHttp {
                name: name.to_string(),
                message: "connection reset".to_string(),
            }),
        }
    }
}

fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (path, content) in files {
        writer.start_file(*path, SimpleFileOptions::default()).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn config_in(temp: &tempfile::TempDir, studies: &[&str]) -> PipelineConfig {
    PipelineConfig {
        archive_base_url: "https://archive.test/files".to_string(),
        download_dir: Utf8PathBuf::from_path_buf(temp.path().join("data")).unwrap(),
        studies: studies.iter().map(|name| name.parse().unwrap()).collect(),
        ..PipelineConfig::default()
    }
}

#[test]
fn static_list_end_to_end() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(&temp, &["ICB_Braun"]);
    let archives = MockArchives::default().with(
        "ICB_Braun",
        build_zip(&[("a.txt", b"first file"), ("sub/b.txt", b"second file")]),
    );
    let app = App::new(UnreachableCatalog, archives);

    let report = app.run(&config, &JsonOutput).unwrap();

    assert_eq!(report.installed(), 1);
    assert_eq!(report.items[0].stage, DatasetStage::Done);
    assert_eq!(
        report.items[0].archive_url,
        "https://archive.test/files/ICB_Braun.zip?=download=1"
    );
    let root = temp.path().join("data").join("ICB_Braun");
    assert_eq!(fs::read(root.join("a.txt")).unwrap(), b"first file");
    assert_eq!(fs::read(root.join("sub/b.txt")).unwrap(), b"second file");
}

#[test]
fn abort_policy_stops_at_first_failure() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(&temp, &["ICB_Missing", "ICB_Braun"]);
    let archives = MockArchives::default().with("ICB_Braun", build_zip(&[("a.txt", b"a")]));
    let app = App::new(UnreachableCatalog, archives);

    let err = app.run(&config, &JsonOutput).unwrap_err();

    assert_matches!(err, FetchError::ArchiveHttp { .. });
    let data = temp.path().join("data");
    assert!(data.join("ICB_Missing").is_dir());
    assert!(!data.join("ICB_Braun").exists());
}

#[test]
fn continue_policy_installs_remaining_datasets() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = config_in(&temp, &["ICB_Missing", "ICB_Braun"]);
    config.failure_policy = FailurePolicy::Continue;
    let archives = MockArchives::default().with("ICB_Braun", build_zip(&[("a.txt", b"a")]));
    let app = App::new(UnreachableCatalog, archives);

    let report = app.run(&config, &JsonOutput).unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.installed(), 1);
    let failed = &report.items[0];
    assert_eq!(failed.status, OutcomeStatus::Failed);
    assert_eq!(failed.stage, DatasetStage::DirectoryCreated);
    assert!(
        failed
            .error
            .as_deref()
            .is_some_and(|message| message.contains("connection reset"))
    );
    assert!(temp.path().join("data/ICB_Braun/a.txt").is_file());
}

#[test]
fn rerun_into_populated_directory_fails() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(&temp, &["ICB_Braun"]);
    let archives = MockArchives::default().with("ICB_Braun", build_zip(&[("a.txt", b"a")]));
    let app = App::new(UnreachableCatalog, archives);

    app.run(&config, &JsonOutput).unwrap();
    let err = app.run(&config, &JsonOutput).unwrap_err();

    assert_matches!(err, FetchError::DestinationExists(_));
}

#[test]
fn report_serializes_for_json_output() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = config_in(&temp, &["ICB_Braun"]);
    config.dry_run = true;
    let app = App::new(UnreachableCatalog, MockArchives::default());

    let report = app.run(&config, &JsonOutput).unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["source"], "static");
    assert_eq!(value["items"][0]["status"], "planned");
    assert_eq!(value["items"][0]["stage"], "pending");
    assert_eq!(value["items"][0]["name"], "ICB_Braun");
}

fn catalog_config_in(temp: &tempfile::TempDir, policy: FailurePolicy) -> PipelineConfig {
    PipelineConfig {
        extras: Vec::new(),
        failure_policy: policy,
        ..config_in(temp, &[])
    }
}

#[test]
fn continue_policy_records_invalid_catalog_names() {
    let temp = tempfile::tempdir().unwrap();
    let config = catalog_config_in(&temp, FailurePolicy::Continue);
    let archives = MockArchives::default()
        .with("ICB_Braun", build_zip(&[("a.txt", b"a")]))
        .with("ICB_Gide", build_zip(&[("g.txt", b"g")]));
    let app = App::new(ListedCatalog(vec!["ICB_Braun", "ICB/Bad", "ICB_Gide"]), archives);

    let report = app.run(&config, &JsonOutput).unwrap();

    assert_eq!(report.installed(), 2);
    assert_eq!(report.failed(), 1);
    let rejected = &report.items[1];
    assert_eq!(rejected.name, "ICB/Bad");
    assert_eq!(rejected.status, OutcomeStatus::Failed);
    assert_eq!(rejected.stage, DatasetStage::Pending);
    assert!(rejected.error.is_some());
    let data = temp.path().join("data");
    assert!(data.join("ICB_Braun/a.txt").is_file());
    assert!(data.join("ICB_Gide/g.txt").is_file());
    assert!(!data.join("ICB").exists());
}

#[test]
fn abort_policy_rejects_invalid_catalog_names_before_installing() {
    let temp = tempfile::tempdir().unwrap();
    let config = catalog_config_in(&temp, FailurePolicy::Abort);
    let archives = MockArchives::default().with("ICB_Braun", build_zip(&[("a.txt", b"a")]));
    let app = App::new(ListedCatalog(vec!["ICB_Braun", "ICB/Bad"]), archives);

    let err = app.run(&config, &JsonOutput).unwrap_err();

    assert_matches!(err, FetchError::InvalidDatasetName(raw) if raw == "ICB/Bad");
    assert!(!temp.path().join("data/ICB_Braun").exists());
}
