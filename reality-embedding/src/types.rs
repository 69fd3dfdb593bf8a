//! Core types for embeddings

use async_trait::async_trait;

use crate::error::{EmbeddingError, Result};

/// Embedding vector
pub type EmbeddingVector = Vec<f32>;

/// Maps an ordered batch of titles to one vector per title
#[async_trait]
pub trait TitleEmbedder: Send + Sync {
    /// Embed `titles`, returning vectors in the same order
    async fn embed_titles(&self, titles: &[String]) -> Result<Vec<EmbeddingVector>>;
}

/// Check a batch returned for `expected` inputs
///
/// Every vector must be present, share one dimension, and hold only finite
/// values.
pub fn check_batch(vectors: &[EmbeddingVector], expected: usize) -> Result<()> {
    if vectors.len() != expected {
        return Err(EmbeddingError::CountMismatch {
            expected,
            actual: vectors.len(),
        });
    }

    let Some(first) = vectors.first() else {
        return Ok(());
    };

    for (index, vector) in vectors.iter().enumerate() {
        if vector.len() != first.len() {
            return Err(EmbeddingError::InvalidDimension {
                expected: first.len(),
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(EmbeddingError::NonFinite { index });
        }
    }

    Ok(())
}
