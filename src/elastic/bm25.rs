use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::document::Document;
use crate::errors::RetrievalError;
use crate::retriever::Retriever;

use super::query;
use super::ElasticClient;

/// Lexical retriever scoring documents with the engine's BM25 ranking.
///
/// Optional metadata filters and required keyword phrases narrow the
/// candidate set; the query itself is matched against the text field.
pub struct Bm25Retriever {
    client: Arc<ElasticClient>,
    index: String,
    filter: Map<String, Value>,
    keywords: Vec<String>,
}

impl Bm25Retriever {
    pub fn new(client: Arc<ElasticClient>, index: impl Into<String>) -> Self {
        Self {
            client,
            index: index.into(),
            filter: Map::new(),
            keywords: Vec::new(),
        }
    }

    /// Require exact metadata matches (`field` against its keyword
    /// subfield) on every hit.
    pub fn with_filter(mut self, filter: Map<String, Value>) -> Self {
        self.filter = filter;
        self
    }

    /// Require every keyword to appear as a phrase in the text.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }
}

#[async_trait]
impl Retriever for Bm25Retriever {
    fn name(&self) -> &str {
        "bm25"
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Document>, RetrievalError> {
        if k == 0 {
            return Err(RetrievalError::Config("k must be positive".to_string()));
        }
        let body = query::bm25_query(query, k, &self.filter, &self.keywords);
        let response = self.client.search(&self.index, &body).await?;
        let documents = super::parse_hits(&response, k)?;
        tracing::debug!(
            "bm25 retrieved {} documents from index {}",
            documents.len(),
            self.index
        );
        Ok(documents)
    }
}
