//! Library configuration.
//!
//! Typed sections with serde `Default`s, loadable from YAML. Environment
//! variables (`ELASTICSEARCH_HOST`, `ELASTICSEARCH_API_KEY`,
//! `OPENAI_API_KEY`) override file values, so secrets can stay out of
//! config files.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ensemble::FusionWeights;
use crate::errors::RetrievalError;
use crate::retry::RetryPolicy;

/// Connection settings for the search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticConfig {
    pub url: String,
    pub index: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index: "default_pdf_index".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Settings for the embedding endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible API, without the `/embeddings`
    /// suffix.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Must match the index mapping's dense vector dimensionality.
    pub dimensions: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            timeout_secs: 30,
        }
    }
}

/// Retrieval and fusion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result count requested from each sub-retriever.
    pub k: usize,
    pub lexical_weight: f64,
    pub vector_weight: f64,
    /// Phrases every lexical hit must contain.
    pub keywords: Vec<String>,
    /// Exact-match metadata constraints for the lexical retriever.
    pub filter: Map<String, Value>,
    /// Dense vector field name in the index mapping.
    pub vector_field: String,
    /// Fixed ANN candidate pool; derived from `k` when unset.
    pub num_candidates: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k: 3,
            lexical_weight: 0.5,
            vector_weight: 0.5,
            keywords: Vec::new(),
            filter: Map::new(),
            vector_field: "vector".to_string(),
            num_candidates: None,
        }
    }
}

impl SearchConfig {
    pub fn weights(&self) -> FusionWeights {
        FusionWeights::new(self.lexical_weight, self.vector_weight)
    }
}

/// Backoff settings for external calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocfuseConfig {
    pub elasticsearch: ElasticConfig,
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
    pub retry: RetryConfig,
}

impl DocfuseConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load a YAML file, then apply environment overrides on top.
    /// Missing sections and fields fall back to their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, RetrievalError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            RetrievalError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            RetrievalError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(host) = env::var("ELASTICSEARCH_HOST") {
            if !host.is_empty() {
                self.elasticsearch.url = host;
            }
        }
        if let Ok(key) = env::var("ELASTICSEARCH_API_KEY") {
            if !key.is_empty() {
                self.elasticsearch.api_key = Some(key);
            }
        }
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.embedding.api_key = Some(key);
            }
        }
    }

    /// Reject configurations no retrieval can run with. A weight pair
    /// that does not sum to 1.0 is allowed but logged.
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.elasticsearch.url.trim().is_empty() {
            return Err(RetrievalError::Config(
                "elasticsearch.url cannot be empty".to_string(),
            ));
        }
        if self.elasticsearch.index.trim().is_empty() {
            return Err(RetrievalError::Config(
                "elasticsearch.index cannot be empty".to_string(),
            ));
        }
        if self.search.k == 0 {
            return Err(RetrievalError::Config(
                "search.k must be at least 1".to_string(),
            ));
        }
        if !self.search.lexical_weight.is_finite() || !self.search.vector_weight.is_finite() {
            return Err(RetrievalError::Config(
                "search weights must be finite".to_string(),
            ));
        }
        if self.search.lexical_weight < 0.0 || self.search.vector_weight < 0.0 {
            return Err(RetrievalError::Config(
                "search weights must be non-negative".to_string(),
            ));
        }
        if self.embedding.dimensions == 0 {
            return Err(RetrievalError::Config(
                "embedding.dimensions must be at least 1".to_string(),
            ));
        }
        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            return Err(RetrievalError::Config(
                "retry.backoff_multiplier must be at least 1.0".to_string(),
            ));
        }
        let sum = self.search.lexical_weight + self.search.vector_weight;
        if (sum - 1.0).abs() > 1e-9 {
            tracing::warn!("Search weights sum to {}, not 1.0", sum);
        }
        Ok(())
    }
}
