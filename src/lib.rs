//! Hybrid document retrieval over an Elasticsearch-compatible engine.
//!
//! A lexical BM25 retriever and a dense-vector KNN retriever run
//! concurrently against the same index; their ranked lists are merged by
//! weighted reciprocal rank fusion into one list the generation step can
//! consume. The engine is accessed read-only and query embedding goes
//! through an OpenAI-compatible endpoint; ingestion and answer
//! generation live elsewhere.

pub mod config;
pub mod context;
pub mod document;
pub mod elastic;
pub mod embedding;
pub mod ensemble;
pub mod errors;
pub mod logging;
pub mod retriever;
pub mod retry;

pub use config::DocfuseConfig;
pub use document::{Document, RankedResult};
pub use elastic::{Bm25Retriever, ElasticClient, KnnRetriever};
pub use embedding::{Embedder, OpenAiEmbedder};
pub use ensemble::{EnsembleRetriever, FusionWeights};
pub use errors::RetrievalError;
pub use retriever::Retriever;
pub use retry::{retry, RetryPolicy};

use std::sync::Arc;

/// Assemble the full hybrid stack from configuration: one shared engine
/// client, a BM25 retriever with the configured filters and keywords,
/// and a KNN retriever embedding through the configured endpoint, fused
/// with the configured weights.
pub fn hybrid_retriever(config: &DocfuseConfig) -> Result<EnsembleRetriever, RetrievalError> {
    config.validate()?;
    let client = Arc::new(ElasticClient::new(&config.elasticsearch)?);
    let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(&config.embedding)?);

    let lexical = Bm25Retriever::new(client.clone(), config.elasticsearch.index.clone())
        .with_filter(config.search.filter.clone())
        .with_keywords(config.search.keywords.clone());

    let mut vector = KnnRetriever::new(client, config.elasticsearch.index.clone(), embedder)
        .with_vector_field(config.search.vector_field.clone());
    if let Some(num_candidates) = config.search.num_candidates {
        vector = vector.with_num_candidates(num_candidates);
    }

    Ok(EnsembleRetriever::new(
        Arc::new(lexical),
        Arc::new(vector),
        config.search.weights(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_default_config_assembles_a_retriever() {
        let retriever = hybrid_retriever(&DocfuseConfig::default()).unwrap();
        assert_eq!(retriever.name(), "ensemble");
    }

    #[test]
    fn an_invalid_config_is_rejected_at_assembly() {
        let mut config = DocfuseConfig::default();
        config.search.k = 0;
        assert!(matches!(
            hybrid_retriever(&config),
            Err(RetrievalError::Config(_))
        ));
    }
}
