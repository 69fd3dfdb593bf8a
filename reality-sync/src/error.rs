//! Error types for a reconciliation run

use reality_core::RealityError;
use reality_embedding::EmbeddingError;
use reality_kalshi::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to fetch events: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Core(#[from] RealityError),

    #[error("Upstream returned no events")]
    EmptyFeed,
}
