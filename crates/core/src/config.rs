use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub bronze: BronzeConfig,
    pub sources: SourcesConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            store: StoreConfig::from_env(),
            bronze: BronzeConfig::from_env(),
            sources: SourcesConfig::from_env(),
            http: HttpConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  store:    endpoint={}, region={}",
            self.store.endpoint_url.as_deref().unwrap_or("(aws default)"),
            self.store.region,
        );
        tracing::info!(
            "  bronze:   bucket={}, staging_dir={}",
            self.bronze.bucket,
            self.bronze.staging_dir.display(),
        );
        tracing::info!(
            "  sources:  api=[{}], dataset={}",
            self.sources
                .api
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            self.sources.kaggle_dataset,
        );
        tracing::info!(
            "  kaggle:   credentials={}",
            if self.sources.kaggle_configured() { "set" } else { "(none)" },
        );
        tracing::info!("  http:     timeout={}s", self.http.timeout_secs);
    }
}

// ── Object store ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// S3-compatible endpoint (e.g. a local MinIO). When unset the
    /// standard AWS config chain is used.
    pub endpoint_url: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl StoreConfig {
    fn from_env() -> Self {
        Self {
            endpoint_url: env_opt("S3_ENDPOINT_URL"),
            region: env_or("S3_REGION", "us-east-1"),
            access_key_id: env_opt("S3_ACCESS_KEY_ID"),
            secret_access_key: env_opt("S3_SECRET_ACCESS_KEY"),
        }
    }

    pub fn has_static_credentials(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }
}

// ── Bronze layer ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BronzeConfig {
    pub bucket: String,
    /// Parent directory for per-run staging dirs (dataset downloads).
    pub staging_dir: PathBuf,
}

impl BronzeConfig {
    fn from_env() -> Self {
        let staging_dir = env_opt("STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);
        Self {
            bucket: env_or("BRONZE_BUCKET", "bronze"),
            staging_dir,
        }
    }
}

// ── Sources ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// API sources in ingestion order.
    pub api: Vec<ApiSource>,
    /// Kaggle dataset identifier (`owner/slug`).
    pub kaggle_dataset: String,
    pub kaggle_username: Option<String>,
    pub kaggle_key: Option<String>,
}

const DEFAULT_API_SOURCES: &str =
    "products=https://dummyjson.com/products,users=https://dummyjson.com/users";

impl SourcesConfig {
    fn from_env() -> Self {
        let raw = env_or("API_SOURCES", DEFAULT_API_SOURCES);
        Self {
            api: parse_api_sources(&raw),
            kaggle_dataset: env_or("KAGGLE_DATASET", "olistbr/brazilian-ecommerce"),
            kaggle_username: env_opt("KAGGLE_USERNAME"),
            kaggle_key: env_opt("KAGGLE_KEY"),
        }
    }

    pub fn kaggle_configured(&self) -> bool {
        self.kaggle_username.is_some() && self.kaggle_key.is_some()
    }
}

/// Parse `name=url[,name=url...]`. Entries without a `=` are skipped.
fn parse_api_sources(raw: &str) -> Vec<ApiSource> {
    raw.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            let (name, url) = entry.split_once('=')?;
            if name.is_empty() || url.is_empty() {
                return None;
            }
            Some(ApiSource {
                name: name.trim().to_string(),
                url: url.trim().to_string(),
            })
        })
        .collect()
}

// ── HTTP client ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request deadline for source fetches.
    pub timeout_secs: u64,
}

impl HttpConfig {
    fn from_env() -> Self {
        Self {
            timeout_secs: env_u64("HTTP_TIMEOUT_SECS", 30),
        }
    }
}
