use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use crate::error::FetchError;

const KAGGLE_DOWNLOAD_URL: &str = "https://www.kaggle.com/api/v1/datasets/download";

/// One flat file materialized from a dataset archive.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub name: String,
    pub path: PathBuf,
}

/// Scoped staging directory for a dataset download.
///
/// The directory is removed when the value is dropped, so cleanup runs
/// on every exit path of an ingestion; a removal failure is logged and
/// never masks the error that unwound the run.
pub struct Staging {
    dir: Option<tempfile::TempDir>,
    path: PathBuf,
}

impl Staging {
    pub fn new(parent: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(parent)?;
        let dir = tempfile::Builder::new()
            .prefix("bronze-staging-")
            .tempdir_in(parent)?;
        let path = dir.path().to_path_buf();
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                warn!(error = %e, "failed to remove staging dir");
            }
        }
    }
}

/// Trait for dataset-archive backends, mirroring [`crate::SourceFetcher`].
#[async_trait]
pub trait DatasetFetcher: Send + Sync {
    /// Download and extract the dataset into `dest`, returning the
    /// extracted flat files.
    async fn fetch(&self, dataset: &str, dest: &Path) -> Result<Vec<StagedFile>, FetchError>;
}

/// Downloads dataset archives over Kaggle's public API (basic auth
/// with the account's API token).
pub struct KaggleFetcher {
    client: Client,
    username: String,
    key: String,
}

impl KaggleFetcher {
    pub fn new(
        username: impl Into<String>,
        key: impl Into<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            username: username.into(),
            key: key.into(),
        })
    }
}

#[async_trait]
impl DatasetFetcher for KaggleFetcher {
    async fn fetch(&self, dataset: &str, dest: &Path) -> Result<Vec<StagedFile>, FetchError> {
        let url = format!("{KAGGLE_DOWNLOAD_URL}/{dataset}");
        info!(dataset, "downloading dataset archive");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.key))
            .send()
            .await
            .map_err(|e| FetchError::remote(dataset, e.status().map(|s| s.as_u16()), &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::remote(
                dataset,
                Some(status.as_u16()),
                format!("unexpected status {status}"),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::remote(dataset, None, &e))?;

        info!(dataset, bytes = body.len(), "downloaded dataset archive");
        extract_archive(dataset, &body, dest)?;

        let files = staged_csv_files(dest)
            .map_err(|e| FetchError::remote(dataset, None, format!("enumerating files: {e}")))?;
        info!(dataset, files = files.len(), "extracted dataset archive");
        Ok(files)
    }
}

/// Unpack a zip archive into `dest`. Entries escaping the destination
/// (zip-slip) are skipped.
fn extract_archive(dataset: &str, bytes: &[u8], dest: &Path) -> Result<(), FetchError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| FetchError::remote(dataset, None, format!("corrupt archive: {e}")))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| FetchError::remote(dataset, None, format!("corrupt archive: {e}")))?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            warn!(dataset, entry = entry.name(), "skipping unsafe archive entry");
            continue;
        };
        let out_path = dest.join(relative);
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| FetchError::remote(dataset, None, format!("extraction: {e}")))?;
        }
        let mut out = std::fs::File::create(&out_path)
            .map_err(|e| FetchError::remote(dataset, None, format!("extraction: {e}")))?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|e| FetchError::remote(dataset, None, format!("extraction: {e}")))?;
    }

    Ok(())
}

/// Enumerate extracted `.csv` files (top level only, sorted by name).
fn staged_csv_files(dir: &Path) -> std::io::Result<Vec<StagedFile>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            files.push(StagedFile {
                name: name.to_string(),
                path: path.clone(),
            });
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
