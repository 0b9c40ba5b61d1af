//! Query embedding.
//!
//! The vector retriever never computes embeddings itself; it goes through
//! the [`Embedder`] trait so tests can substitute a deterministic impl and
//! deployments can point at any OpenAI-compatible endpoint.

mod openai;

pub use openai::OpenAiEmbedder;

use async_trait::async_trait;

use crate::errors::RetrievalError;

/// Turns text into dense vectors compatible with the index mapping.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier sent to the service.
    fn model_name(&self) -> &str;

    /// Dimensionality of the produced vectors.
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts; output order matches input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let inputs = [text.to_string()];
        let mut batch = self.embed_batch(&inputs).await?;
        if batch.len() != 1 {
            return Err(RetrievalError::Embedding(format!(
                "expected 1 vector, got {}",
                batch.len()
            )));
        }
        Ok(batch.remove(0))
    }
}
