//! Reconciliation of a fetched feed against the stored dataset
//!
//! Stored vectors are reused for every id already known; only ids seen for
//! the first time are sent to the embedding generator, in a single batch.

use reality_core::{MarketRecord, MarketSnapshot, Platform, RealityError};
use reality_embedding::{check_batch, EmbeddingError, EmbeddingVector, TitleEmbedder};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, instrument};

use crate::delta::{dedupe_snapshots, DeltaPlan};
use crate::error::SyncError;

/// Counts for one reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub new: usize,
    pub updated: usize,
    pub expired: usize,
    pub total: usize,
}

impl fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} new, {} updated, {} expired ({} total)",
            self.new, self.updated, self.expired, self.total
        )
    }
}

/// Next dataset state
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// Records in feed order
    pub records: Vec<MarketRecord>,
    pub summary: ReconcileSummary,
}

/// Builds the next dataset from a feed and the stored records
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    source: Platform,
}

impl Reconciler {
    pub fn new(source: Platform) -> Self {
        Self { source }
    }

    /// Reconcile `current` against `previous`
    ///
    /// `embedder_factory` is called only if the feed holds at least one new
    /// id, and never more than once.
    #[instrument(skip_all, fields(current = current.len(), previous = previous.len()))]
    pub async fn reconcile<F, E>(
        &self,
        current: Vec<MarketSnapshot>,
        previous: &HashMap<String, MarketRecord>,
        embedder_factory: F,
    ) -> Result<Reconciled, SyncError>
    where
        F: FnOnce() -> Result<E, EmbeddingError>,
        E: TitleEmbedder,
    {
        let fetched = current.len();
        let current = dedupe_snapshots(current);
        if current.len() < fetched {
            debug!("Dropped {} duplicate ids from feed", fetched - current.len());
        }

        let plan = DeltaPlan::compute(&current, previous);
        debug!(
            "Delta plan: {} new, {} updated, {} expired",
            plan.new_ids.len(),
            plan.updated_ids.len(),
            plan.expired_ids.len()
        );

        let mut vectors = if plan.has_new() {
            let pending: Vec<&MarketSnapshot> =
                current.iter().filter(|s| plan.is_new(&s.id)).collect();
            let embedder = embedder_factory()?;
            Self::embed_new(&embedder, &pending).await?
        } else {
            debug!("No new markets, skipping embedding");
            HashMap::new()
        };

        let records = current
            .iter()
            .map(|snapshot| match previous.get(&snapshot.id) {
                Some(stored) => Ok(stored.refreshed(snapshot, self.source)),
                None => vectors
                    .remove(snapshot.id.as_str())
                    .map(|vector| MarketRecord::embedded(snapshot, &vector, self.source))
                    .ok_or_else(|| {
                        RealityError::internal(format!(
                            "No embedding for new market {}",
                            snapshot.id
                        ))
                    }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let summary = ReconcileSummary {
            new: plan.new_ids.len(),
            updated: plan.updated_ids.len(),
            expired: plan.expired_ids.len(),
            total: records.len(),
        };
        debug!("Reconciled markets: {}", summary);

        Ok(Reconciled { records, summary })
    }

    /// Embed all pending titles in one call and key the vectors by id
    async fn embed_new<'a, E: TitleEmbedder>(
        embedder: &E,
        pending: &[&'a MarketSnapshot],
    ) -> Result<HashMap<&'a str, EmbeddingVector>, SyncError> {
        let titles: Vec<String> = pending.iter().map(|s| s.title.clone()).collect();
        info!("Generating embeddings for {} new markets", titles.len());

        let vectors = embedder.embed_titles(&titles).await?;
        check_batch(&vectors, titles.len())?;

        Ok(pending
            .iter()
            .map(|s| s.id.as_str())
            .zip(vectors)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Embeds a title as `[len / 100, offset]` and records each batch
    struct FakeEmbedder {
        offset: f32,
        batches: Arc<std::sync::Mutex<Vec<Vec<String>>>>,
    }

    #[async_trait]
    impl TitleEmbedder for FakeEmbedder {
        async fn embed_titles(
            &self,
            titles: &[String],
        ) -> reality_embedding::Result<Vec<EmbeddingVector>> {
            self.batches.lock().unwrap().push(titles.to_vec());
            Ok(titles
                .iter()
                .map(|t| vec![t.len() as f32 / 100.0, self.offset])
                .collect())
        }
    }

    /// Returns one vector fewer than asked for
    struct ShortEmbedder;

    #[async_trait]
    impl TitleEmbedder for ShortEmbedder {
        async fn embed_titles(
            &self,
            titles: &[String],
        ) -> reality_embedding::Result<Vec<EmbeddingVector>> {
            Ok(titles.iter().skip(1).map(|_| vec![0.0]).collect())
        }
    }

    struct Harness {
        factory_calls: Arc<AtomicUsize>,
        batches: Arc<std::sync::Mutex<Vec<Vec<String>>>>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                factory_calls: Arc::new(AtomicUsize::new(0)),
                batches: Arc::new(std::sync::Mutex::new(Vec::new())),
            }
        }

        fn factory(&self, offset: f32) -> impl FnOnce() -> Result<FakeEmbedder, EmbeddingError> {
            let calls = Arc::clone(&self.factory_calls);
            let batches = Arc::clone(&self.batches);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(FakeEmbedder { offset, batches })
            }
        }

        fn factory_calls(&self) -> usize {
            self.factory_calls.load(Ordering::SeqCst)
        }
    }

    fn stored(id: &str, vector: Vec<f64>) -> (String, MarketRecord) {
        let record = MarketRecord {
            id: id.to_string(),
            title: format!("Old {}", id),
            probability: 0.1,
            vector,
            source: Platform::Kalshi,
        };
        (id.to_string(), record)
    }

    #[tokio::test]
    async fn test_new_updated_expired() {
        let harness = Harness::new();
        let previous: HashMap<_, _> = [stored("B", vec![0.9, 0.9]), stored("X", vec![0.5, 0.5])]
            .into_iter()
            .collect();
        let current = vec![
            MarketSnapshot::new("A", "Alpha", 0.123456),
            MarketSnapshot::new("B", "Beta renamed", 0.87654),
        ];

        let reconciled = Reconciler::new(Platform::Kalshi)
            .reconcile(current, &previous, harness.factory(0.2))
            .await
            .unwrap();

        assert_eq!(
            reconciled.summary,
            ReconcileSummary {
                new: 1,
                updated: 1,
                expired: 1,
                total: 2,
            }
        );

        let ids: Vec<&str> = reconciled.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);

        let a = &reconciled.records[0];
        assert_eq!(a.probability, 0.1235);
        assert_eq!(a.vector, vec![0.05, 0.2]);

        let b = &reconciled.records[1];
        assert_eq!(b.vector, vec![0.9, 0.9]);
        assert_eq!(b.title, "Beta renamed");
        assert_eq!(b.probability, 0.8765);

        assert_eq!(harness.factory_calls(), 1);
        assert_eq!(*harness.batches.lock().unwrap(), vec![vec!["Alpha".to_string()]]);
    }

    #[tokio::test]
    async fn test_factory_not_called_without_new_ids() {
        let harness = Harness::new();
        let previous: HashMap<_, _> = [stored("A", vec![0.3])].into_iter().collect();

        let reconciled = Reconciler::new(Platform::Kalshi)
            .reconcile(
                vec![MarketSnapshot::new("A", "Alpha", 0.4)],
                &previous,
                harness.factory(0.0),
            )
            .await
            .unwrap();

        assert_eq!(harness.factory_calls(), 0);
        assert_eq!(reconciled.records[0].vector, vec![0.3]);
        assert_eq!(reconciled.summary.new, 0);
    }

    #[tokio::test]
    async fn test_new_titles_sent_in_one_ordered_batch() {
        let harness = Harness::new();
        let previous: HashMap<_, _> = [stored("B", vec![0.3])].into_iter().collect();
        let current = vec![
            MarketSnapshot::new("C", "Gamma", 0.1),
            MarketSnapshot::new("B", "Beta", 0.2),
            MarketSnapshot::new("A", "Alpha!", 0.3),
        ];

        let reconciled = Reconciler::new(Platform::Kalshi)
            .reconcile(current, &previous, harness.factory(0.0))
            .await
            .unwrap();

        assert_eq!(
            *harness.batches.lock().unwrap(),
            vec![vec!["Gamma".to_string(), "Alpha!".to_string()]]
        );
        assert_eq!(reconciled.records[0].vector, vec![0.05, 0.0]);
        assert_eq!(reconciled.records[2].vector, vec![0.06, 0.0]);
    }

    #[tokio::test]
    async fn test_duplicate_feed_ids_kept_once() {
        let harness = Harness::new();
        let current = vec![
            MarketSnapshot::new("A", "First", 0.1),
            MarketSnapshot::new("A", "Second", 0.9),
        ];

        let reconciled = Reconciler::new(Platform::Kalshi)
            .reconcile(current, &HashMap::new(), harness.factory(0.0))
            .await
            .unwrap();

        assert_eq!(reconciled.records.len(), 1);
        assert_eq!(reconciled.records[0].title, "First");
        assert_eq!(*harness.batches.lock().unwrap(), vec![vec!["First".to_string()]]);
    }

    #[tokio::test]
    async fn test_short_batch_is_an_error() {
        let current = vec![
            MarketSnapshot::new("A", "Alpha", 0.1),
            MarketSnapshot::new("B", "Beta", 0.2),
        ];

        let result = Reconciler::new(Platform::Kalshi)
            .reconcile(current, &HashMap::new(), || Ok(ShortEmbedder))
            .await;

        assert!(matches!(
            result,
            Err(SyncError::Embedding(EmbeddingError::CountMismatch {
                expected: 2,
                actual: 1,
            }))
        ));
    }

    #[tokio::test]
    async fn test_factory_error_propagates() {
        let result = Reconciler::new(Platform::Kalshi)
            .reconcile(
                vec![MarketSnapshot::new("A", "Alpha", 0.1)],
                &HashMap::new(),
                || -> Result<ShortEmbedder, EmbeddingError> {
                    Err(EmbeddingError::Config("OPENAI_API_KEY is not set".to_string()))
                },
            )
            .await;

        assert!(matches!(result, Err(SyncError::Embedding(EmbeddingError::Config(_)))));
    }
}
