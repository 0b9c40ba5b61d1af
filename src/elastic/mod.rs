//! Elasticsearch-backed retrieval.
//!
//! [`ElasticClient`] covers the transport (read-only search endpoints);
//! [`Bm25Retriever`] and [`KnnRetriever`] sit on top of it and map index
//! hits into [`Document`]s. Request bodies live in [`query`].

mod bm25;
mod client;
mod knn;
pub mod query;

pub use bm25::Bm25Retriever;
pub use client::ElasticClient;
pub use knn::KnnRetriever;

use serde_json::{json, Value};

use crate::document::Document;
use crate::errors::RetrievalError;

/// Map a search response into at most `k` documents.
///
/// The envelope must carry a `hits.hits` array or the whole response is
/// rejected. Individual hits without a text payload are skipped with a
/// warning rather than failing the batch; an engine over-delivering
/// beyond `k` is cut back.
pub(crate) fn parse_hits(response: &Value, k: usize) -> Result<Vec<Document>, RetrievalError> {
    let hits = response
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(|h| h.as_array())
        .ok_or_else(|| {
            RetrievalError::InvalidResponse("search response has no hits array".to_string())
        })?;

    let mut documents = Vec::with_capacity(hits.len().min(k));
    for hit in hits {
        let source = match hit.get("_source") {
            Some(source) => source,
            None => {
                tracing::warn!("Skipping search hit without _source");
                continue;
            }
        };
        let content = match source.get("text").and_then(|t| t.as_str()) {
            Some(text) => text,
            None => {
                tracing::warn!("Skipping search hit without a text field");
                continue;
            }
        };
        let metadata = source.get("metadata").cloned().unwrap_or_else(|| json!({}));
        documents.push(Document::new(content, metadata));
    }
    documents.truncate(k);
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hits_maps_text_and_metadata() {
        let response = json!({
            "hits": { "hits": [
                { "_source": { "text": "alpha", "metadata": { "source": "a.pdf", "page": 0 } } },
                { "_source": { "text": "beta", "metadata": { "source": "b.pdf", "page": 2 } } },
            ] }
        });
        let docs = parse_hits(&response, 2).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "alpha");
        assert_eq!(docs[0].source(), Some("a.pdf"));
        assert_eq!(docs[1].page(), Some(2));
    }

    #[test]
    fn parse_hits_rejects_responses_without_a_hit_list() {
        let err = parse_hits(&json!({ "error": "index_not_found" }), 3).unwrap_err();
        assert!(matches!(err, RetrievalError::InvalidResponse(_)));
    }

    #[test]
    fn parse_hits_skips_hits_without_text() {
        let response = json!({
            "hits": { "hits": [
                { "_source": { "metadata": { "source": "a.pdf" } } },
                { "_source": { "text": "kept", "metadata": {} } },
            ] }
        });
        let docs = parse_hits(&response, 5).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "kept");
    }

    #[test]
    fn parse_hits_defaults_missing_metadata_to_an_empty_object() {
        let response = json!({ "hits": { "hits": [ { "_source": { "text": "bare" } } ] } });
        let docs = parse_hits(&response, 1).unwrap();
        assert_eq!(docs[0].metadata, json!({}));
        assert_eq!(docs[0].source(), None);
    }

    #[test]
    fn parse_hits_handles_empty_hit_lists() {
        let response = json!({ "hits": { "hits": [] } });
        assert!(parse_hits(&response, 3).unwrap().is_empty());
    }

    #[test]
    fn parse_hits_returns_at_most_k_documents() {
        let response = json!({
            "hits": { "hits": [
                { "_source": { "text": "first", "metadata": {} } },
                { "_source": { "text": "second", "metadata": {} } },
                { "_source": { "text": "third", "metadata": {} } },
            ] }
        });
        let docs = parse_hits(&response, 2).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "first");
        assert_eq!(docs[1].content, "second");
    }
}
