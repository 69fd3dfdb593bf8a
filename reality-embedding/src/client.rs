//! OpenAI embedding client

use async_openai::{
    config::OpenAIConfig,
    types::embeddings::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::{
    error::{EmbeddingError, Result},
    types::{check_batch, EmbeddingVector, TitleEmbedder},
};

/// Default embedding model
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Maximum inputs the embeddings endpoint accepts per request
pub const MAX_BATCH_SIZE: usize = 2048;

/// Settings for the embedding client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingConfig {
    pub api_key: Option<String>,
    pub model: String,
    /// Requested output dimension, `None` for the model's native size
    pub dimensions: Option<u32>,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            dimensions: None,
            batch_size: MAX_BATCH_SIZE,
        }
    }
}

/// OpenAI embedding client
pub struct EmbeddingClient {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: Option<u32>,
    batch_size: usize,
}

impl EmbeddingClient {
    /// Create a client from configuration
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| EmbeddingError::Config("OPENAI_API_KEY is not set".to_string()))?;

        if config.model.trim().is_empty() {
            return Err(EmbeddingError::Config("Embedding model name is empty".to_string()));
        }

        let openai = OpenAIConfig::new().with_api_key(api_key);
        Ok(Self {
            client: Client::with_config(openai),
            model: config.model.clone(),
            dimensions: config.dimensions,
            batch_size: config.batch_size.clamp(1, MAX_BATCH_SIZE),
        })
    }

    /// Embed one request's worth of titles
    async fn embed_chunk(&self, titles: &[String]) -> Result<Vec<EmbeddingVector>> {
        let request = CreateEmbeddingRequest {
            model: self.model.clone(),
            input: EmbeddingInput::StringArray(titles.to_vec()),
            encoding_format: None,
            dimensions: self.dimensions,
            user: None,
        };

        let response = self.client.embeddings().create(request).await?;

        let indexed = response
            .data
            .into_iter()
            .map(|e| (e.index, e.embedding))
            .collect();

        order_by_index(indexed, titles.len())
    }
}

#[async_trait]
impl TitleEmbedder for EmbeddingClient {
    #[instrument(skip(self, titles), fields(count = titles.len()))]
    async fn embed_titles(&self, titles: &[String]) -> Result<Vec<EmbeddingVector>> {
        let mut vectors = Vec::with_capacity(titles.len());

        for chunk in titles.chunks(self.batch_size) {
            debug!("Embedding batch of {} titles", chunk.len());
            vectors.extend(self.embed_chunk(chunk).await?);
        }

        check_batch(&vectors, titles.len())?;

        if let Some(expected) = self.dimensions {
            let actual = vectors.first().map(Vec::len).unwrap_or(expected as usize);
            if actual != expected as usize {
                return Err(EmbeddingError::InvalidDimension {
                    expected: expected as usize,
                    actual,
                });
            }
        }

        info!(
            "Generated {} embeddings: dimension={}, model={}",
            vectors.len(),
            vectors.first().map(Vec::len).unwrap_or(0),
            self.model
        );

        Ok(vectors)
    }
}

/// Put response rows back in request order
///
/// The API tags every row with the position of its input; rows may arrive
/// in any order.
fn order_by_index(
    mut rows: Vec<(u32, EmbeddingVector)>,
    expected: usize,
) -> Result<Vec<EmbeddingVector>> {
    if rows.len() != expected {
        return Err(EmbeddingError::CountMismatch {
            expected,
            actual: rows.len(),
        });
    }

    rows.sort_by_key(|(index, _)| *index);

    let gap = rows
        .iter()
        .enumerate()
        .find(|(position, (index, _))| *index as usize != *position);
    if let Some((position, _)) = gap {
        return Err(EmbeddingError::MissingIndex { index: position });
    }

    Ok(rows.into_iter().map(|(_, vector)| vector).collect())
}

impl std::fmt::Debug for EmbeddingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingClient")
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}
