use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

/// One object listed from a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
}

/// The object-store collaborator contract.
///
/// Backends: [`crate::S3BlobStore`] for S3-compatible stores (MinIO
/// included) and [`crate::MemoryBlobStore`] for tests and dry runs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError>;

    /// Create a bucket. An "already exists" outcome is success, so
    /// concurrent first-time setups are safe.
    async fn make_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    /// Upload a blob in a single PUT with its exact byte length.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// Upload a local file as a single object.
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// List all objects in the bucket, recursively, sorted by key.
    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectInfo>, StoreError>;
}
