//! Core retrieval types.
//!
//! A `Document` is one retrievable chunk: its text content plus the flat
//! metadata object the index stores alongside it (`source`, `page`, ...).
//! Documents are created by a retrieval call and never mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A retrieved chunk with its index metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// The text content of the chunk.
    pub content: String,
    /// Flat metadata object (source identifier, page number, ...).
    #[serde(default)]
    pub metadata: Value,
}

impl Document {
    /// Create a new document.
    pub fn new(content: impl Into<String>, metadata: Value) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// The source identifier (URL, filename, ...) if the index stored one.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(|v| v.as_str())
    }

    /// The 0-based page number if the index stored one.
    pub fn page(&self) -> Option<i64> {
        self.metadata.get("page").and_then(|v| v.as_i64())
    }

    /// Identity used for de-duplication across result lists.
    ///
    /// Two documents are the same chunk when content and source both match;
    /// identical text from two different sources stays distinct.
    pub fn identity(&self) -> DocumentKey {
        DocumentKey {
            content: self.content.clone(),
            source: self.source().map(|s| s.to_string()),
        }
    }
}

/// De-duplication key: content plus source identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    content: String,
    source: Option<String>,
}

/// One entry of a fused result list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    pub document: Document,
    /// Combined fusion score (higher = better).
    pub score: f64,
    /// 0-based position in the fused list.
    pub rank: usize,
}
