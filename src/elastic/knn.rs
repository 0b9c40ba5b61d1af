use std::sync::Arc;

use async_trait::async_trait;

use crate::document::Document;
use crate::embedding::Embedder;
use crate::errors::RetrievalError;
use crate::retriever::Retriever;

use super::query;
use super::ElasticClient;

/// Vector retriever: embeds the query and runs the engine's approximate
/// nearest-neighbour search over the dense vector field.
///
/// Similarity is the index mapping's concern (the default mapping uses
/// cosine); no distances are computed locally.
pub struct KnnRetriever {
    client: Arc<ElasticClient>,
    index: String,
    embedder: Arc<dyn Embedder>,
    vector_field: String,
    num_candidates: Option<usize>,
}

impl KnnRetriever {
    pub fn new(
        client: Arc<ElasticClient>,
        index: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            client,
            index: index.into(),
            embedder,
            vector_field: "vector".to_string(),
            num_candidates: None,
        }
    }

    /// Override the dense vector field name of the index mapping.
    pub fn with_vector_field(mut self, field: impl Into<String>) -> Self {
        self.vector_field = field.into();
        self
    }

    /// Fix the candidate pool size instead of deriving it from `k`.
    pub fn with_num_candidates(mut self, num_candidates: usize) -> Self {
        self.num_candidates = Some(num_candidates);
        self
    }

    fn candidates_for(&self, k: usize) -> usize {
        self.num_candidates.unwrap_or_else(|| (k * 10).max(50))
    }
}

#[async_trait]
impl Retriever for KnnRetriever {
    fn name(&self) -> &str {
        "knn"
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Document>, RetrievalError> {
        if k == 0 {
            return Err(RetrievalError::Config("k must be positive".to_string()));
        }
        let query_vector = self.embedder.embed(query).await?;
        let body = query::knn_query(&query_vector, k, self.candidates_for(k), &self.vector_field);
        let response = self.client.search(&self.index, &body).await?;
        let documents = super::parse_hits(&response, k)?;
        tracing::debug!(
            "knn retrieved {} documents from index {} (model {})",
            documents.len(),
            self.index,
            self.embedder.model_name()
        );
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ElasticConfig;

    struct NullEmbedder;

    #[async_trait]
    impl Embedder for NullEmbedder {
        fn model_name(&self) -> &str {
            "null"
        }

        fn dimensions(&self) -> usize {
            3
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
            Ok(texts.iter().map(|_| vec![0.0, 0.0, 0.0]).collect())
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        fn model_name(&self) -> &str {
            "broken"
        }

        fn dimensions(&self) -> usize {
            3
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
            Err(RetrievalError::Embedding("no quota".to_string()))
        }
    }

    fn make_retriever(embedder: Arc<dyn Embedder>) -> KnnRetriever {
        let client = Arc::new(ElasticClient::new(&ElasticConfig::default()).unwrap());
        KnnRetriever::new(client, "test_index", embedder)
    }

    #[test]
    fn candidate_pool_scales_with_k_but_never_drops_below_fifty() {
        let retriever = make_retriever(Arc::new(NullEmbedder));
        assert_eq!(retriever.candidates_for(3), 50);
        assert_eq!(retriever.candidates_for(10), 100);
    }

    #[test]
    fn configured_candidate_pool_wins() {
        let retriever = make_retriever(Arc::new(NullEmbedder)).with_num_candidates(200);
        assert_eq!(retriever.candidates_for(3), 200);
    }

    #[tokio::test]
    async fn zero_k_is_rejected_before_embedding() {
        let retriever = make_retriever(Arc::new(BrokenEmbedder));
        let err = retriever.retrieve("query", 0).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Config(_)));
    }

    #[tokio::test]
    async fn embedding_failures_propagate_untouched() {
        let retriever = make_retriever(Arc::new(BrokenEmbedder));
        let err = retriever.retrieve("query", 3).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Embedding(_)));
    }
}
