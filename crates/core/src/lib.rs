pub mod config;

pub use config::{load_dotenv, ApiSource, BronzeConfig, Config, HttpConfig, SourcesConfig, StoreConfig};
