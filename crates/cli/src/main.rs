//! bronze — bronze-layer batch ingestion CLI.
//!
//! Subcommands map one-to-one onto the external scheduler's tasks:
//! `setup`, `ingest-dataset`, `ingest-api`, `validate`, and `run` for
//! the whole daily pipeline. Success and failure surface through the
//! process exit code; retry policy lives entirely in the scheduler.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use bronze_core::Config;
use bronze_ingest::{ApiFetcher, DatasetFetcher, KaggleFetcher, Pipeline, SourceFetcher};
use bronze_storage::{BlobStore, S3BlobStore};

/// Bronze-layer batch ingestion for the data lake.
#[derive(Parser, Debug)]
#[command(name = "bronze", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the bronze bucket if it does not exist (idempotent).
    Setup,
    /// Fetch every configured API source and upload the payloads.
    IngestApi,
    /// Download the configured dataset archive and upload its files.
    IngestDataset,
    /// List bronze bucket contents and report the most recent objects.
    Validate,
    /// Full daily pipeline: setup, dataset ingestion, API ingestion,
    /// validation.
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    bronze_core::load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    if matches!(cli.command, Command::IngestDataset | Command::Run)
        && !config.sources.kaggle_configured()
    {
        anyhow::bail!("KAGGLE_USERNAME and KAGGLE_KEY must be set for dataset ingestion");
    }

    let timeout = Duration::from_secs(config.http.timeout_secs);
    let store: Arc<dyn BlobStore> = Arc::new(S3BlobStore::from_config(&config.store).await);
    let api: Arc<dyn SourceFetcher> =
        Arc::new(ApiFetcher::new(timeout).context("building HTTP client")?);
    let dataset: Arc<dyn DatasetFetcher> = Arc::new(
        KaggleFetcher::new(
            config.sources.kaggle_username.clone().unwrap_or_default(),
            config.sources.kaggle_key.clone().unwrap_or_default(),
            timeout,
        )
        .context("building Kaggle client")?,
    );

    let pipeline = Pipeline::new(store, api, dataset, &config);

    match cli.command {
        Command::Setup => pipeline.setup().await?,
        Command::IngestApi => pipeline.ingest_api().await?,
        Command::IngestDataset => pipeline.ingest_dataset().await?,
        Command::Validate => {
            pipeline.validate().await?;
        }
        Command::Run => pipeline.run().await?,
    }

    info!("done");
    Ok(())
}
