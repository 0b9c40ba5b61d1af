//! The retriever abstraction.
//!
//! Every retrieval strategy (lexical, vector, ensemble) implements this
//! trait, so callers and the fusion layer can hold them as trait objects
//! and swap strategies without code changes.

use async_trait::async_trait;

use crate::document::Document;
use crate::errors::RetrievalError;

/// A ranked document retriever.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Short name used in logs ("bm25", "knn", "ensemble").
    fn name(&self) -> &str;

    /// Retrieve the best-matching documents for `query`, most relevant
    /// first.
    ///
    /// `k` caps how many results each underlying ranked list contributes;
    /// fewer (including zero) may come back when little matches. Returns
    /// an error only when the retrieval itself failed, never for an
    /// empty match set.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Document>, RetrievalError>;
}
