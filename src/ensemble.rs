//! Weighted rank fusion over the lexical and vector retrievers.
//!
//! The two sub-retrievals run concurrently and are merged by reciprocal
//! rank fusion: each list contributes `weight / (c + rank + 1)` for the
//! document at 0-based `rank`, contributions for the same chunk are
//! summed, and the merged list is sorted by combined score. Only list
//! positions enter the formula, never the engine's raw scores.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::document::{Document, DocumentKey, RankedResult};
use crate::errors::RetrievalError;
use crate::retriever::Retriever;

/// Rank constant of reciprocal rank fusion.
const DEFAULT_RRF_C: f64 = 60.0;

/// Per-list fusion weights. Intended to sum to 1.0; a deviating sum is
/// logged at construction but honoured as given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub lexical: f64,
    pub vector: f64,
}

impl FusionWeights {
    pub fn new(lexical: f64, vector: f64) -> Self {
        Self { lexical, vector }
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            lexical: 0.5,
            vector: 0.5,
        }
    }
}

/// Hybrid retriever combining a lexical and a vector sub-retriever.
pub struct EnsembleRetriever {
    lexical: Arc<dyn Retriever>,
    vector: Arc<dyn Retriever>,
    weights: FusionWeights,
    rrf_c: f64,
}

struct FusedEntry {
    document: Document,
    score: f64,
}

impl EnsembleRetriever {
    pub fn new(
        lexical: Arc<dyn Retriever>,
        vector: Arc<dyn Retriever>,
        weights: FusionWeights,
    ) -> Self {
        let sum = weights.lexical + weights.vector;
        if (sum - 1.0).abs() > 1e-9 {
            tracing::warn!("Fusion weights sum to {}, not 1.0", sum);
        }
        Self {
            lexical,
            vector,
            weights,
            rrf_c: DEFAULT_RRF_C,
        }
    }

    /// Override the rank constant.
    pub fn with_rrf_c(mut self, rrf_c: f64) -> Self {
        self.rrf_c = rrf_c;
        self
    }

    /// Run both sub-retrievals concurrently and fuse the results.
    ///
    /// `k` caps each sub-list, not the fused output, which can hold up
    /// to `2 * k` unique documents. A failure on either side fails the
    /// whole retrieval; there is no partial-result fallback.
    pub async fn retrieve_ranked(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RankedResult>, RetrievalError> {
        let (lexical, vector) = tokio::try_join!(
            self.lexical.retrieve(query, k),
            self.vector.retrieve(query, k)
        )?;
        tracing::debug!(
            "fusing {} lexical and {} vector results",
            lexical.len(),
            vector.len()
        );
        Ok(self.fuse(lexical, vector))
    }

    /// Merge two ranked lists into one.
    ///
    /// Documents are de-duplicated by content+source identity, with a
    /// chunk present in both lists keeping one entry that carries both
    /// contributions. Ties keep first-seen order, the lexical list being
    /// scanned first. A non-positive weight removes that list entirely,
    /// membership included.
    pub fn fuse(&self, lexical: Vec<Document>, vector: Vec<Document>) -> Vec<RankedResult> {
        let mut entries: Vec<FusedEntry> = Vec::new();
        let mut seen: HashMap<DocumentKey, usize> = HashMap::new();

        let lists = [
            (lexical, self.weights.lexical),
            (vector, self.weights.vector),
        ];
        for (documents, weight) in lists {
            if weight <= 0.0 {
                continue;
            }
            for (rank, document) in documents.into_iter().enumerate() {
                let contribution = weight / (self.rrf_c + rank as f64 + 1.0);
                match seen.entry(document.identity()) {
                    Entry::Occupied(slot) => entries[*slot.get()].score += contribution,
                    Entry::Vacant(slot) => {
                        slot.insert(entries.len());
                        entries.push(FusedEntry {
                            document,
                            score: contribution,
                        });
                    }
                }
            }
        }

        // Stable sort, so equal scores stay in insertion order.
        entries.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        entries
            .into_iter()
            .enumerate()
            .map(|(rank, entry)| RankedResult {
                document: entry.document,
                score: entry.score,
                rank,
            })
            .collect()
    }
}

#[async_trait]
impl Retriever for EnsembleRetriever {
    fn name(&self) -> &str {
        "ensemble"
    }

    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Document>, RetrievalError> {
        let ranked = self.retrieve_ranked(query, k).await?;
        Ok(ranked.into_iter().map(|r| r.document).collect())
    }
}
