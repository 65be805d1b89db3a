use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use bronze_core::{ApiSource, Config};
use bronze_storage::{BlobStore, BronzeWriter, ObjectInfo};

use crate::api::SourceFetcher;
use crate::dataset::{DatasetFetcher, Staging};
use crate::error::IngestError;

/// Key category for API-derived objects.
pub const API_CATEGORY: &str = "api_data";
/// Key category for dataset-derived objects.
pub const DATASET_CATEGORY: &str = "kaggle_data";

/// Sequences fetchers and the bronze writer for one ingestion run.
///
/// Fail-fast: the first fetch or write failure is logged with its
/// source context and propagated; later sources are not attempted.
/// There is no resume — the external trigger retries whole runs.
pub struct Pipeline {
    store: Arc<dyn BlobStore>,
    writer: BronzeWriter,
    api: Arc<dyn SourceFetcher>,
    dataset: Arc<dyn DatasetFetcher>,
    sources: Vec<ApiSource>,
    dataset_id: String,
    staging_parent: PathBuf,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn BlobStore>,
        api: Arc<dyn SourceFetcher>,
        dataset: Arc<dyn DatasetFetcher>,
        config: &Config,
    ) -> Self {
        let writer = BronzeWriter::new(store.clone(), config.bronze.bucket.clone());
        Self {
            store,
            writer,
            api,
            dataset,
            sources: config.sources.api.clone(),
            dataset_id: config.sources.kaggle_dataset.clone(),
            staging_parent: config.bronze.staging_dir.clone(),
        }
    }

    /// Idempotent bucket creation.
    pub async fn setup(&self) -> Result<(), IngestError> {
        if let Err(e) = self.writer.ensure_bucket().await {
            error!(bucket = %self.writer.bucket(), error = %e, "bucket setup failed");
            return Err(e.into());
        }
        Ok(())
    }

    /// Fetch and upload every configured API source, in order.
    pub async fn ingest_api(&self) -> Result<(), IngestError> {
        info!("starting API ingestion");
        self.setup().await?;

        for source in &self.sources {
            let value = match self.api.fetch(&source.name, &source.url).await {
                Ok(value) => value,
                Err(e) => {
                    error!(source = %source.name, error = %e, "API fetch failed");
                    return Err(e.into());
                }
            };
            if let Err(e) = self.writer.write_json(API_CATEGORY, &source.name, &value).await {
                error!(source = %source.name, error = %e, "API upload failed");
                return Err(e.into());
            }
        }

        info!(sources = self.sources.len(), "API ingestion complete");
        Ok(())
    }

    /// Download the dataset archive and upload every extracted file
    /// under one shared run timestamp. The staging dir is removed on
    /// all exit paths.
    pub async fn ingest_dataset(&self) -> Result<(), IngestError> {
        info!(dataset = %self.dataset_id, "starting dataset ingestion");
        self.setup().await?;

        let staging = Staging::new(&self.staging_parent)?;
        let files = match self.dataset.fetch(&self.dataset_id, staging.path()).await {
            Ok(files) => files,
            Err(e) => {
                error!(dataset = %self.dataset_id, error = %e, "dataset fetch failed");
                return Err(e.into());
            }
        };

        let run_at = Utc::now();
        for file in &files {
            if let Err(e) = self
                .writer
                .write_file_at(DATASET_CATEGORY, &file.name, &file.path, run_at)
                .await
            {
                error!(file = %file.name, error = %e, "dataset upload failed");
                return Err(e.into());
            }
        }

        info!(files = files.len(), "dataset ingestion complete");
        Ok(())
    }

    /// List bronze contents and report the most recent objects.
    pub async fn validate(&self) -> Result<Vec<ObjectInfo>, IngestError> {
        let objects = match self.store.list_objects(self.writer.bucket()).await {
            Ok(objects) => objects,
            Err(e) => {
                error!(bucket = %self.writer.bucket(), error = %e, "validation listing failed");
                return Err(e.into());
            }
        };

        info!(bucket = %self.writer.bucket(), objects = objects.len(), "bronze validation");
        for object in objects.iter().rev().take(5) {
            info!(key = %object.key, size = object.size, "recent bronze object");
        }
        Ok(objects)
    }

    /// Full daily run in the scheduler's order: setup, dataset
    /// ingestion, API ingestion, validation.
    pub async fn run(&self) -> Result<(), IngestError> {
        self.setup().await?;
        self.ingest_dataset().await?;
        self.ingest_api().await?;
        self.validate().await?;
        info!("bronze ingestion run complete");
        Ok(())
    }
}
