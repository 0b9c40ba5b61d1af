//! Thin read-only HTTP client for the search engine.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::config::ElasticConfig;
use crate::errors::RetrievalError;

use super::query;

/// Cap for unranked index scans.
const MAX_SCAN_DOCS: usize = 1000;

/// Client for one Elasticsearch endpoint.
///
/// Construction is cheap and the client is `Send + Sync`; share a single
/// instance across retrievers with an `Arc`.
pub struct ElasticClient {
    base_url: String,
    client: Client,
}

impl ElasticClient {
    pub fn new(config: &ElasticConfig) -> Result<Self, RetrievalError> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("ApiKey {}", api_key))
                .map_err(|e| RetrievalError::config(format!("Invalid API key: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| RetrievalError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// POST a search body to `<index>/_search` and return the raw
    /// response envelope.
    pub async fn search(&self, index: &str, body: &Value) -> Result<Value, RetrievalError> {
        let url = self.search_url(index);
        let res = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(RetrievalError::from_transport)?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }
        res.json().await.map_err(|e| {
            RetrievalError::invalid_response(format!("Search response was not JSON: {}", e))
        })
    }

    /// Fetch a single document by id. `Ok(None)` when the id does not
    /// exist in the index.
    pub async fn get_doc(&self, index: &str, doc_id: &str) -> Result<Option<Value>, RetrievalError> {
        let url = self.doc_url(index, doc_id);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(RetrievalError::from_transport)?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }
        let payload: Value = res.json().await.map_err(|e| {
            RetrievalError::invalid_response(format!("Document response was not JSON: {}", e))
        })?;
        let source = payload.get("_source").cloned().ok_or_else(|| {
            RetrievalError::InvalidResponse("document response has no _source".to_string())
        })?;
        Ok(Some(source))
    }

    /// List the stored documents of an index, unranked, as raw `_source`
    /// objects. Capped at [`MAX_SCAN_DOCS`]; meant for index inspection,
    /// not retrieval.
    pub async fn all_docs(&self, index: &str) -> Result<Vec<Value>, RetrievalError> {
        let body = query::match_all_query(MAX_SCAN_DOCS);
        let response = self.search(index, &body).await?;
        let hits = response
            .get("hits")
            .and_then(|h| h.get("hits"))
            .and_then(|h| h.as_array())
            .ok_or_else(|| {
                RetrievalError::InvalidResponse("search response has no hits array".to_string())
            })?;
        Ok(hits.iter().filter_map(|hit| hit.get("_source").cloned()).collect())
    }

    fn search_url(&self, index: &str) -> String {
        format!("{}/{}/_search", self.base_url, urlencoding::encode(index))
    }

    fn doc_url(&self, index: &str, doc_id: &str) -> String {
        format!(
            "{}/{}/_doc/{}",
            self.base_url,
            urlencoding::encode(index),
            urlencoding::encode(doc_id)
        )
    }
}

/// Map a non-success HTTP status onto the error taxonomy: server-side
/// failures and throttling are retryable, anything else means the
/// request itself was rejected.
fn classify_status(status: StatusCode, body: &str) -> RetrievalError {
    if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        RetrievalError::Timeout(format!("Engine answered {}: {}", status, body))
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        RetrievalError::Unavailable(format!("Engine answered {}: {}", status, body))
    } else {
        RetrievalError::InvalidResponse(format!("Engine rejected request with {}: {}", status, body))
    }
}
