use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use indexfeed_core::config::EmbeddingConfig;
use indexfeed_core::IngestError;

use super::traits::{Embedder, EmbeddingError};

/// Embedding backend for OpenAI-compatible `/v1/embeddings` endpoints.
///
/// Owns one reusable HTTP connection for the lifetime of the run; the
/// client is dropped (and the connection released) with the pipeline
/// context at shutdown.
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    /// Build from validated configuration. Fails if the model name does not
    /// map to a known vector dimension.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, IngestError> {
        let dimensions = config.dimensions()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| IngestError::Config(format!("HTTP client: {err}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimensions,
        })
    }
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedItem>,
}

#[derive(Deserialize)]
struct EmbedItem {
    embedding: Vec<f32>,
    index: usize,
}

/// Classify an API error body into the distinct kinds callers care about.
fn classify_api_error(status: reqwest::StatusCode, body: String) -> EmbeddingError {
    let lowered = body.to_ascii_lowercase();
    if lowered.contains("model") && lowered.contains("not") && lowered.contains("found")
        || lowered.contains("does not exist")
    {
        EmbeddingError::UnknownModel(body)
    } else if lowered.contains("maximum context length") || lowered.contains("too long") {
        EmbeddingError::InputTooLong(body)
    } else {
        EmbeddingError::Api(format!("{status}: {body}"))
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = EmbedRequest {
            model: self.model.clone(),
            input: texts.iter().map(|t| t.to_string()).collect(),
        };

        let mut builder = self
            .client
            .post(format!("{}/v1/embeddings", self.endpoint))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status, body));
        }

        let mut parsed: EmbedResponse = response.json().await?;

        // The API may return items out of order; restore input order.
        parsed.data.sort_by_key(|item| item.index);

        let embeddings: Vec<Vec<f32>> =
            parsed.data.into_iter().map(|item| item.embedding).collect();

        for vector in &embeddings {
            if vector.len() != self.dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: vector.len(),
                });
            }
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_known_model() {
        let config = EmbeddingConfig {
            endpoint: "https://api.openai.com/".into(),
            api_key: Some("key".into()),
            model: "text-embedding-3-large".into(),
            timeout_secs: 30,
        };
        let embedder = OpenAiEmbedder::from_config(&config).unwrap();
        assert_eq!(embedder.dimensions(), 3072);
        assert_eq!(embedder.endpoint, "https://api.openai.com");
    }

    #[test]
    fn rejects_unknown_model_at_construction() {
        let config = EmbeddingConfig {
            endpoint: "https://api.openai.com".into(),
            api_key: None,
            model: "word2vec".into(),
            timeout_secs: 30,
        };
        assert!(OpenAiEmbedder::from_config(&config).is_err());
    }

    #[test]
    fn api_error_classification() {
        let status = reqwest::StatusCode::NOT_FOUND;
        let err = classify_api_error(status, "The model `x` does not exist".into());
        assert!(matches!(err, EmbeddingError::UnknownModel(_)));

        let status = reqwest::StatusCode::BAD_REQUEST;
        let err = classify_api_error(status, "This model's maximum context length is 8192".into());
        assert!(matches!(err, EmbeddingError::InputTooLong(_)));

        let status = reqwest::StatusCode::INTERNAL_SERVER_ERROR;
        let err = classify_api_error(status, "oops".into());
        assert!(matches!(err, EmbeddingError::Api(_)));
    }
}
