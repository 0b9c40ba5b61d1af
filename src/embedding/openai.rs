use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::config::EmbeddingConfig;
use crate::errors::RetrievalError;

use super::Embedder;

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    endpoint: String,
    model: String,
    dimensions: usize,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// The API key is optional so self-hosted OpenAI-compatible endpoints
    /// without auth keep working; the hosted API rejects keyless calls
    /// with a 401, surfaced as an `Embedding` error.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, RetrievalError> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| RetrievalError::config(format!("Invalid API key: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| RetrievalError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
            client,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/embeddings", self.endpoint);
        let payload = json!({
            "model": self.model,
            "input": texts,
        });
        let res = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(RetrievalError::from_transport)?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                return Err(RetrievalError::Unavailable(format!(
                    "Embedding service answered {}: {}",
                    status, text
                )));
            }
            return Err(RetrievalError::Embedding(format!(
                "Embedding request rejected with {}: {}",
                status, text
            )));
        }
        let response: EmbeddingResponse = res.json().await.map_err(|e| {
            RetrievalError::invalid_response(format!("Embedding response was not JSON: {}", e))
        })?;
        vectors_in_order(response.data, texts.len(), self.dimensions)
    }
}

/// Reassemble the service's vectors into input order and check that the
/// batch is complete and dimensioned for the index mapping.
fn vectors_in_order(
    mut data: Vec<EmbeddingData>,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>, RetrievalError> {
    if data.len() != expected {
        return Err(RetrievalError::Embedding(format!(
            "embedding service returned {} vectors for {} inputs",
            data.len(),
            expected
        )));
    }
    data.sort_by_key(|d| d.index);
    for entry in &data {
        if dimensions > 0 && entry.embedding.len() != dimensions {
            return Err(RetrievalError::Embedding(format!(
                "embedding has {} dimensions, index expects {}",
                entry.embedding.len(),
                dimensions
            )));
        }
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: usize, embedding: Vec<f32>) -> EmbeddingData {
        EmbeddingData { index, embedding }
    }

    #[test]
    fn vectors_are_reordered_by_index() {
        let data = vec![entry(1, vec![1.0, 1.0]), entry(0, vec![0.0, 0.0])];
        let vectors = vectors_in_order(data, 2, 2).unwrap();
        assert_eq!(vectors, vec![vec![0.0, 0.0], vec![1.0, 1.0]]);
    }

    #[test]
    fn an_incomplete_batch_is_an_embedding_error() {
        let data = vec![entry(0, vec![0.0, 0.0])];
        let err = vectors_in_order(data, 2, 2).unwrap_err();
        assert!(matches!(err, RetrievalError::Embedding(_)));
    }

    #[test]
    fn wrongly_sized_vectors_are_rejected() {
        let data = vec![entry(0, vec![0.0, 0.0, 0.0])];
        let err = vectors_in_order(data, 1, 2).unwrap_err();
        assert!(matches!(err, RetrievalError::Embedding(_)));
        assert!(err.to_string().contains("dimensions"));
    }

    #[test]
    fn zero_configured_dimensions_skips_the_size_check() {
        let data = vec![entry(0, vec![0.5; 7])];
        assert!(vectors_in_order(data, 1, 0).is_ok());
    }

    #[test]
    fn construction_works_without_an_api_key() {
        let config = EmbeddingConfig {
            api_key: None,
            ..EmbeddingConfig::default()
        };
        let embedder = OpenAiEmbedder::new(&config).unwrap();
        assert_eq!(embedder.model_name(), "text-embedding-3-small");
        assert_eq!(embedder.dimensions(), 1536);
    }

    #[tokio::test]
    async fn an_empty_batch_never_calls_the_service() {
        let embedder = OpenAiEmbedder::new(&EmbeddingConfig::default()).unwrap();
        let vectors = embedder.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
