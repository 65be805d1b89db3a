use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::blob::BlobStore;
use crate::error::StoreError;

/// Timestamp format used in bronze object keys (second precision).
const KEY_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Compute a bronze object key: `{category}/{timestamp}/{file_name}`.
///
/// `file_name` carries its own extension (`products.json`,
/// `orders.csv`). Keys are timestamp-qualified so repeated runs append
/// next to prior ones; within one second the key repeats — an accepted
/// limitation of the convention.
pub fn object_key(category: &str, file_name: &str, at: DateTime<Utc>) -> String {
    format!("{}/{}/{}", category, at.format(KEY_TIMESTAMP_FORMAT), file_name)
}

fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("json") => "application/json",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

/// Writes payloads into the bronze bucket under timestamped keys.
///
/// Objects are immutable once written: the writer only ever issues
/// single-blob PUTs to fresh keys and never deletes.
pub struct BronzeWriter {
    store: Arc<dyn BlobStore>,
    bucket: String,
}

impl BronzeWriter {
    pub fn new(store: Arc<dyn BlobStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Create the bronze bucket if it does not exist yet.
    pub async fn ensure_bucket(&self) -> Result<(), StoreError> {
        if self.store.bucket_exists(&self.bucket).await? {
            info!(bucket = %self.bucket, "bucket already exists");
        } else {
            self.store.make_bucket(&self.bucket).await?;
            info!(bucket = %self.bucket, "created bucket");
        }
        Ok(())
    }

    /// Upload a structured payload as pretty-printed JSON, keyed at the
    /// current wall-clock time. Returns the object key.
    pub async fn write_json(
        &self,
        category: &str,
        source: &str,
        value: &serde_json::Value,
    ) -> Result<String, StoreError> {
        self.write_json_at(category, source, value, Utc::now()).await
    }

    /// Same as [`write_json`](Self::write_json) with an explicit
    /// timestamp (one shared instant for all objects of a run).
    pub async fn write_json_at(
        &self,
        category: &str,
        source: &str,
        value: &serde_json::Value,
        at: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let body = serde_json::to_vec_pretty(value)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        let key = object_key(category, &format!("{source}.json"), at);
        let length = body.len();
        self.store
            .put_object(&self.bucket, &key, Bytes::from(body), "application/json")
            .await?;
        info!(bucket = %self.bucket, key = %key, bytes = length, "uploaded payload");
        Ok(key)
    }

    /// Upload a local file unchanged, keyed at the current wall-clock
    /// time. Returns the object key.
    pub async fn write_file(
        &self,
        category: &str,
        file_name: &str,
        path: &Path,
    ) -> Result<String, StoreError> {
        self.write_file_at(category, file_name, path, Utc::now()).await
    }

    /// Same as [`write_file`](Self::write_file) with an explicit
    /// timestamp.
    pub async fn write_file_at(
        &self,
        category: &str,
        file_name: &str,
        path: &Path,
        at: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let key = object_key(category, file_name, at);
        self.store
            .put_file(&self.bucket, &key, path, content_type_for(file_name))
            .await?;
        info!(bucket = %self.bucket, key = %key, file = %path.display(), "uploaded file");
        Ok(key)
    }
}
