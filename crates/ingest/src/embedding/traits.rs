use async_trait::async_trait;
use thiserror::Error;

use indexfeed_core::IngestError;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("model not recognized by the embedding service: {0}")]
    UnknownModel(String),

    #[error("input exceeds the model's token limit: {0}")]
    InputTooLong(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl From<EmbeddingError> for IngestError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::UnknownModel(_) | EmbeddingError::DimensionMismatch { .. } => {
                IngestError::Config(err.to_string())
            }
            other => IngestError::Embedding(other.to_string()),
        }
    }
}

/// The embedding capability: text in, fixed-length vector out.
///
/// Implementations wrap an external API. Calls are idempotent per input, so
/// retrying a failed call is always safe.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per input (in order).
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// The dimensionality of the output vectors.
    fn dimensions(&self) -> usize;
}
