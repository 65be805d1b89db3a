use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use crate::error::FetchError;

/// Trait for API source backends, so the orchestrator can run against
/// scripted fetchers in tests.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch one source and decode its body as JSON.
    async fn fetch(&self, source: &str, url: &str) -> Result<Value, FetchError>;
}

/// HTTP JSON fetcher. No retries, no caching; a per-request timeout
/// bounds the wait.
pub struct ApiFetcher {
    client: Client,
}

impl ApiFetcher {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SourceFetcher for ApiFetcher {
    async fn fetch(&self, source: &str, url: &str) -> Result<Value, FetchError> {
        info!(source, url, "fetching API source");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::remote(source, e.status().map(|s| s.as_u16()), &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::remote(
                source,
                Some(status.as_u16()),
                format!("unexpected status {status}"),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::remote(source, None, &e))?;

        let value: Value =
            serde_json::from_slice(&body).map_err(|e| FetchError::decode(source, &e))?;

        info!(source, bytes = body.len(), "fetched API source");
        Ok(value)
    }
}
