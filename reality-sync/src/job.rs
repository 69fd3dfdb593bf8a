//! Update and bootstrap runs
//!
//! A run is strictly sequential: fetch every page, then diff, then embed,
//! then write. Either the whole reconciled dataset is written or nothing is.

use async_trait::async_trait;
use reality_core::MarketSnapshot;
use reality_embedding::{EmbeddingError, TitleEmbedder};
use reality_kalshi::{EventsTransport, FetchError, KalshiClient};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::reconcile::{ReconcileSummary, Reconciler};
use crate::store::DatasetStore;

/// Anything that can produce the full current feed
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<MarketSnapshot>, FetchError>;
}

#[async_trait]
impl<T: EventsTransport> EventSource for KalshiClient<T> {
    async fn fetch_all(&self) -> Result<Vec<MarketSnapshot>, FetchError> {
        KalshiClient::fetch_all(self).await
    }
}

/// Result of an update run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Dataset rewritten
    Applied(ReconcileSummary),
    /// Upstream returned nothing; dataset left untouched
    SkippedEmptyFeed,
}

/// Result of a bootstrap run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapReport {
    pub summary: ReconcileSummary,
    pub bytes_written: u64,
}

/// Drives a run against one dataset file
#[derive(Debug, Clone)]
pub struct UpdateJob {
    store: DatasetStore,
    reconciler: Reconciler,
}

impl UpdateJob {
    pub fn new(config: &SyncConfig) -> Self {
        Self::with_store(DatasetStore::new(&config.output_path), Reconciler::new(config.source))
    }

    pub fn with_store(store: DatasetStore, reconciler: Reconciler) -> Self {
        Self { store, reconciler }
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Incremental update
    ///
    /// An empty feed is treated as an upstream outage: the stored dataset is
    /// neither read nor written.
    #[instrument(skip_all, fields(path = %self.store.path().display()))]
    pub async fn run_update<S, F, E>(
        &self,
        source: &S,
        embedder_factory: F,
    ) -> Result<UpdateOutcome, SyncError>
    where
        S: EventSource + ?Sized,
        F: FnOnce() -> Result<E, EmbeddingError>,
        E: TitleEmbedder,
    {
        let current = source.fetch_all().await?;

        if current.is_empty() {
            warn!("API returned 0 events. Exiting without changes.");
            return Ok(UpdateOutcome::SkippedEmptyFeed);
        }

        let previous = self.store.load()?;
        let reconciled = self
            .reconciler
            .reconcile(current, &previous.records, embedder_factory)
            .await?;

        self.store.save(&reconciled.records)?;

        let summary = reconciled.summary;
        info!(
            "Update complete: {} new, {} updated, {} expired",
            summary.new, summary.updated, summary.expired
        );
        info!("Total markets: {}", summary.total);

        Ok(UpdateOutcome::Applied(summary))
    }

    /// Full rebuild: embed every title and overwrite the dataset
    ///
    /// Unlike an update, an empty feed is an error.
    #[instrument(skip_all, fields(path = %self.store.path().display()))]
    pub async fn run_bootstrap<S, F, E>(
        &self,
        source: &S,
        embedder_factory: F,
    ) -> Result<BootstrapReport, SyncError>
    where
        S: EventSource + ?Sized,
        F: FnOnce() -> Result<E, EmbeddingError>,
        E: TitleEmbedder,
    {
        let current = source.fetch_all().await?;

        if current.is_empty() {
            return Err(SyncError::EmptyFeed);
        }
        info!("Fetched {} open events", current.len());

        let reconciled = self
            .reconciler
            .reconcile(current, &HashMap::new(), embedder_factory)
            .await?;

        let bytes_written = self.store.save(&reconciled.records)?;
        info!(
            "Saved {} markets to {} ({:.1} KB, {:.2} MB)",
            reconciled.summary.total,
            self.store.path().display(),
            bytes_written as f64 / 1024.0,
            bytes_written as f64 / (1024.0 * 1024.0)
        );

        Ok(BootstrapReport {
            summary: reconciled.summary,
            bytes_written,
        })
    }
}
