//! Orchestrator tests against the in-memory store with scripted
//! fetchers — no network, no object-store daemon required.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeZone;
use serde_json::{json, Value};

use bronze_core::{ApiSource, BronzeConfig, Config, HttpConfig, SourcesConfig, StoreConfig};
use bronze_ingest::{
    DatasetFetcher, FetchError, IngestError, Pipeline, SourceFetcher, StagedFile,
};
use bronze_storage::{BlobStore, BronzeWriter, MemoryBlobStore};

// ── Scripted collaborators ──────────────────────────────────────────

enum Script {
    Ok(Value),
    RemoteStatus(u16),
    Decode,
}

#[derive(Default)]
struct ScriptedFetcher {
    responses: HashMap<String, Script>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn with(mut self, source: &str, script: Script) -> Self {
        self.responses.insert(source.to_string(), script);
        self
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFetcher for ScriptedFetcher {
    async fn fetch(&self, source: &str, _url: &str) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(source) {
            Some(Script::Ok(value)) => Ok(value.clone()),
            Some(Script::RemoteStatus(status)) => Err(FetchError::remote(
                source,
                Some(*status),
                format!("unexpected status {status}"),
            )),
            Some(Script::Decode) => Err(FetchError::decode(source, "expected value at line 1")),
            None => Err(FetchError::remote(source, None, "unscripted source")),
        }
    }
}

/// Writes the given (name, content) files into the staging dir, then
/// optionally fails, so both cleanup paths can be observed.
struct ScriptedDataset {
    files: Vec<(String, String)>,
    fail_after_staging: bool,
}

#[async_trait]
impl DatasetFetcher for ScriptedDataset {
    async fn fetch(&self, dataset: &str, dest: &Path) -> Result<Vec<StagedFile>, FetchError> {
        let mut staged = Vec::new();
        for (name, content) in &self.files {
            let path = dest.join(name);
            std::fs::write(&path, content)
                .map_err(|e| FetchError::remote(dataset, None, format!("extraction: {e}")))?;
            staged.push(StagedFile {
                name: name.clone(),
                path,
            });
        }
        if self.fail_after_staging {
            return Err(FetchError::remote(dataset, Some(403), "auth rejected"));
        }
        Ok(staged)
    }
}

// ── Harness ─────────────────────────────────────────────────────────

fn test_config(staging: &Path, sources: &[(&str, &str)]) -> Config {
    Config {
        store: StoreConfig {
            endpoint_url: None,
            region: "us-east-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
        },
        bronze: BronzeConfig {
            bucket: "bronze".to_string(),
            staging_dir: staging.to_path_buf(),
        },
        sources: SourcesConfig {
            api: sources
                .iter()
                .map(|(name, url)| ApiSource {
                    name: name.to_string(),
                    url: url.to_string(),
                })
                .collect(),
            kaggle_dataset: "olistbr/brazilian-ecommerce".to_string(),
            kaggle_username: None,
            kaggle_key: None,
        },
        http: HttpConfig { timeout_secs: 5 },
    }
}

struct Harness {
    store: Arc<MemoryBlobStore>,
    api: Arc<ScriptedFetcher>,
    pipeline: Pipeline,
    _staging_parent: tempfile::TempDir,
}

impl Harness {
    fn new(api: ScriptedFetcher, dataset: ScriptedDataset, sources: &[(&str, &str)]) -> Self {
        let staging_parent = tempfile::tempdir().unwrap();
        let config = test_config(staging_parent.path(), sources);
        let store = Arc::new(MemoryBlobStore::new());
        let api = Arc::new(api);
        let pipeline = Pipeline::new(
            store.clone(),
            api.clone(),
            Arc::new(dataset),
            &config,
        );
        Self {
            store,
            api,
            pipeline,
            _staging_parent: staging_parent,
        }
    }

    fn staging_entries(&self) -> usize {
        std::fs::read_dir(self._staging_parent.path()).unwrap().count()
    }
}

fn no_dataset() -> ScriptedDataset {
    ScriptedDataset {
        files: Vec::new(),
        fail_after_staging: false,
    }
}

// ── API ingestion ───────────────────────────────────────────────────

#[tokio::test]
async fn api_ingestion_round_trips_each_source() {
    let products = json!({"id": 1, "title": "foo"});
    let users = json!({"users": [{"id": 7}]});
    let api = ScriptedFetcher::default()
        .with("products", Script::Ok(products.clone()))
        .with("users", Script::Ok(users.clone()));
    let harness = Harness::new(
        api,
        no_dataset(),
        &[("products", "http://api/p"), ("users", "http://api/u")],
    );

    harness.pipeline.ingest_api().await.unwrap();

    let objects = harness.store.list_objects("bronze").await.unwrap();
    assert_eq!(objects.len(), 2);

    for (object, (source, value)) in objects
        .iter()
        .zip([("products", &products), ("users", &users)])
    {
        let parts: Vec<_> = object.key.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "api_data");
        assert_eq!(parts[1].len(), 15);
        assert_eq!(parts[1].as_bytes()[8], b'_');
        assert_eq!(parts[2], format!("{source}.json"));

        let body = harness.store.object("bronze", &object.key).unwrap();
        assert_eq!(&body[..], serde_json::to_vec_pretty(value).unwrap().as_slice());
    }
}

#[tokio::test]
async fn http_error_fails_fast_without_write() {
    let api = ScriptedFetcher::default().with("products", Script::RemoteStatus(500));
    let harness = Harness::new(api, no_dataset(), &[("products", "http://api/p")]);

    let err = harness.pipeline.ingest_api().await.unwrap_err();
    match err {
        IngestError::Fetch(FetchError::RemoteFetch { status, .. }) => {
            assert_eq!(status, Some(500));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(harness.store.list_objects("bronze").await.unwrap().is_empty());
}

#[tokio::test]
async fn decode_error_fails_without_write() {
    let api = ScriptedFetcher::default().with("products", Script::Decode);
    let harness = Harness::new(api, no_dataset(), &[("products", "http://api/p")]);

    let err = harness.pipeline.ingest_api().await.unwrap_err();
    assert!(matches!(
        err,
        IngestError::Fetch(FetchError::PayloadDecode { .. })
    ));
    assert!(harness.store.list_objects("bronze").await.unwrap().is_empty());
}

#[tokio::test]
async fn first_failure_stops_later_sources() {
    let api = ScriptedFetcher::default()
        .with("products", Script::RemoteStatus(500))
        .with("users", Script::Ok(json!({})));
    let harness = Harness::new(
        api,
        no_dataset(),
        &[("products", "http://api/p"), ("users", "http://api/u")],
    );

    harness.pipeline.ingest_api().await.unwrap_err();

    // Only the failing source was attempted.
    assert_eq!(harness.api.call_count(), 1);
    assert!(harness.store.list_objects("bronze").await.unwrap().is_empty());
}

// ── Setup ───────────────────────────────────────────────────────────

#[tokio::test]
async fn setup_is_idempotent() {
    let harness = Harness::new(ScriptedFetcher::default(), no_dataset(), &[]);
    harness.pipeline.setup().await.unwrap();
    harness.pipeline.setup().await.unwrap();
    assert_eq!(harness.store.bucket_count(), 1);
}

// ── Dataset ingestion ───────────────────────────────────────────────

#[tokio::test]
async fn dataset_files_share_one_run_timestamp() {
    let dataset = ScriptedDataset {
        files: vec![
            ("orders.csv".to_string(), "id\n1\n".to_string()),
            ("customers.csv".to_string(), "id\n2\n".to_string()),
        ],
        fail_after_staging: false,
    };
    let harness = Harness::new(ScriptedFetcher::default(), dataset, &[]);

    harness.pipeline.ingest_dataset().await.unwrap();

    let objects = harness.store.list_objects("bronze").await.unwrap();
    assert_eq!(objects.len(), 2);

    let timestamps: Vec<_> = objects
        .iter()
        .map(|o| o.key.split('/').nth(1).unwrap().to_string())
        .collect();
    assert_eq!(timestamps[0], timestamps[1]);
    assert!(objects.iter().all(|o| o.key.starts_with("kaggle_data/")));

    let body = harness
        .store
        .object("bronze", &objects[1].key)
        .unwrap();
    assert_eq!(&body[..], b"id\n1\n");

    // Staging dir was removed after the successful run.
    assert_eq!(harness.staging_entries(), 0);
}

#[tokio::test]
async fn staging_removed_when_dataset_fetch_fails() {
    let dataset = ScriptedDataset {
        files: vec![("orders.csv".to_string(), "id\n1\n".to_string())],
        fail_after_staging: true,
    };
    let harness = Harness::new(ScriptedFetcher::default(), dataset, &[]);

    let err = harness.pipeline.ingest_dataset().await.unwrap_err();
    assert!(matches!(
        err,
        IngestError::Fetch(FetchError::RemoteFetch { status: Some(403), .. })
    ));

    assert!(harness.store.list_objects("bronze").await.unwrap().is_empty());
    assert_eq!(harness.staging_entries(), 0);
}

// ── Full run and validation ─────────────────────────────────────────

#[tokio::test]
async fn full_run_ingests_everything_and_validates() {
    let api = ScriptedFetcher::default().with("products", Script::Ok(json!({"id": 1})));
    let dataset = ScriptedDataset {
        files: vec![("orders.csv".to_string(), "id\n1\n".to_string())],
        fail_after_staging: false,
    };
    let harness = Harness::new(api, dataset, &[("products", "http://api/p")]);

    harness.pipeline.run().await.unwrap();

    let objects = harness.pipeline.validate().await.unwrap();
    assert_eq!(objects.len(), 2);
    assert!(objects.iter().any(|o| o.key.starts_with("api_data/")));
    assert!(objects.iter().any(|o| o.key.starts_with("kaggle_data/")));
}

// ── Writer history semantics (example scenario of the convention) ───

#[tokio::test]
async fn repeated_runs_append_history() {
    let store = Arc::new(MemoryBlobStore::new());
    let writer = BronzeWriter::new(store.clone(), "bronze");
    writer.ensure_bucket().await.unwrap();

    let value = json!({"id": 1, "title": "foo"});
    let first = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap();
    let second = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 18, 0, 0).unwrap();

    let key = writer
        .write_json_at("api_data", "products", &value, first)
        .await
        .unwrap();
    assert_eq!(key, "api_data/20240101_180000/products.json");

    writer
        .write_json_at("api_data", "products", &value, second)
        .await
        .unwrap();

    let objects = store.list_objects("bronze").await.unwrap();
    assert_eq!(objects.len(), 2);
}
