use thiserror::Error;

use bronze_storage::StoreError;

/// Failures producing a payload from an external source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Source unreachable, auth rejected, non-success status, or a
    /// corrupt archive. `status` is set when the remote answered.
    #[error("source {dataset}: remote fetch failed: {reason}")]
    RemoteFetch {
        dataset: String,
        status: Option<u16>,
        reason: String,
    },

    /// The remote answered but the body is not the expected format.
    #[error("source {dataset}: payload decode failed: {reason}")]
    PayloadDecode { dataset: String, reason: String },
}

impl FetchError {
    pub fn remote(source: &str, status: Option<u16>, reason: impl ToString) -> Self {
        Self::RemoteFetch {
            dataset: source.to_string(),
            status,
            reason: reason.to_string(),
        }
    }

    pub fn decode(source: &str, reason: impl ToString) -> Self {
        Self::PayloadDecode {
            dataset: source.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Umbrella error for one ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("local IO error: {0}")]
    LocalIo(#[from] std::io::Error),
}
