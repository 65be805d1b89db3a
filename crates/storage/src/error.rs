use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("bucket {bucket}: creation failed: {reason}")]
    BucketCreate { bucket: String, reason: String },

    #[error("bucket {bucket}: upload of {key} failed: {reason}")]
    Upload {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("bucket {bucket}: listing failed: {reason}")]
    List { bucket: String, reason: String },

    #[error("object store error: {0}")]
    Sdk(String),

    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
