//! Reality Check updater
//!
//! Single-pass batch job meant to run on a schedule:
//! 1. Fetches every open Kalshi event
//! 2. Diffs it against the stored dataset
//! 3. Embeds titles of new markets only
//! 4. Rewrites the dataset file
//!
//! Exit code 0 on success or when upstream returns no events, 1 otherwise.

use anyhow::Context;
use clap::{Parser, Subcommand};
use reality_embedding::EmbeddingClient;
use reality_kalshi::KalshiClient;
use reality_sync::{SyncConfig, SyncError, UpdateJob, UpdateOutcome};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log filter used when `RUST_LOG` is not set
const DEFAULT_LOG_FILTER: &str =
    "info,reality_check=debug,reality_sync=debug,reality_kalshi=debug,reality_embedding=debug";

/// Kalshi market dataset updater
#[derive(Parser)]
#[command(
    name = "reality-check",
    about = "Keeps a Kalshi market dataset with title embeddings up to date"
)]
struct Cli {
    /// Dataset file (overrides REALITY_OUTPUT_PATH)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    /// Incremental update: embed new markets, refresh the rest (default)
    Update,
    /// Rebuild the dataset from scratch, embedding every title
    Bootstrap,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = SyncConfig::from_env().context("Failed to load configuration")?;
    if let Some(output) = cli.output {
        config.output_path = output;
    }

    let command = cli.command.unwrap_or(Command::Update);
    info!("Starting Reality Check {:?} for {}", command, config.output_path.display());

    let client = KalshiClient::new(&config.kalshi).context("Failed to create Kalshi client")?;
    let job = UpdateJob::new(&config);

    let embedding_config = config.embedding.clone();
    let embedder_factory = move || {
        info!("Loading embedding client (model: {})", embedding_config.model);
        EmbeddingClient::from_config(&embedding_config)
    };

    match command {
        Command::Update => match job.run_update(&client, embedder_factory).await {
            Ok(UpdateOutcome::Applied(_)) => Ok(ExitCode::SUCCESS),
            Ok(UpdateOutcome::SkippedEmptyFeed) => Ok(ExitCode::SUCCESS),
            Err(SyncError::Fetch(e)) => {
                error!("ERROR: Failed to fetch events: {}", e);
                Ok(ExitCode::FAILURE)
            }
            Err(e) => Err(e).context("Update failed"),
        },
        Command::Bootstrap => match job.run_bootstrap(&client, embedder_factory).await {
            Ok(report) => {
                info!("Bootstrap complete: {}", report.summary);
                Ok(ExitCode::SUCCESS)
            }
            Err(SyncError::EmptyFeed) => {
                warn!("No events fetched from API, nothing to bootstrap");
                Ok(ExitCode::FAILURE)
            }
            Err(e) => Err(e).context("Bootstrap failed"),
        },
    }
}
