use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::blob::{BlobStore, ObjectInfo};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
}

/// In-memory backend: buckets are maps of key to blob.
///
/// Used by tests and as a dry-run target; semantics mirror the S3
/// backend (PUT to a missing bucket fails, bucket creation is
/// idempotent, listing is key-sorted).
#[derive(Default)]
pub struct MemoryBlobStore {
    buckets: Mutex<HashMap<String, BTreeMap<String, StoredObject>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an object back (test helper).
    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        let buckets = self.buckets.lock().expect("memory store poisoned");
        buckets.get(bucket)?.get(key).map(|o| o.data.clone())
    }

    /// Content type recorded for an object (test helper).
    pub fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        let buckets = self.buckets.lock().expect("memory store poisoned");
        buckets.get(bucket)?.get(key).map(|o| o.content_type.clone())
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.lock().expect("memory store poisoned").len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        let buckets = self.buckets.lock().expect("memory store poisoned");
        Ok(buckets.contains_key(bucket))
    }

    async fn make_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let mut buckets = self.buckets.lock().expect("memory store poisoned");
        buckets.entry(bucket.to_string()).or_default();
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let mut buckets = self.buckets.lock().expect("memory store poisoned");
        let objects = buckets.get_mut(bucket).ok_or_else(|| StoreError::Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: "no such bucket".to_string(),
        })?;
        objects.insert(
            key.to_string(),
            StoredObject {
                data: body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let data = tokio::fs::read(path).await?;
        self.put_object(bucket, key, Bytes::from(data), content_type)
            .await
    }

    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectInfo>, StoreError> {
        let buckets = self.buckets.lock().expect("memory store poisoned");
        let objects = buckets.get(bucket).ok_or_else(|| StoreError::List {
            bucket: bucket.to_string(),
            reason: "no such bucket".to_string(),
        })?;
        Ok(objects
            .iter()
            .map(|(key, object)| ObjectInfo {
                key: key.clone(),
                size: object.data.len() as u64,
            })
            .collect())
    }
}
