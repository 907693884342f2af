//! Exact similarity search over the vector store.
//!
//! Every chunk of every document is scored by cosine similarity against the
//! query. Chunks scoring above the relevance threshold are kept; if none
//! does, all scored chunks are kept instead so that a populated store never
//! answers with nothing. Survivors are sorted by descending score (stable,
//! so ties keep scan order) and truncated to `top_k`.

use crate::store::{StoreSnapshot, VectorStore};
use crate::types::{Chunk, Document, SearchResult};
use crate::vector_index::VectorIndex;
use manualqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Scores must be strictly greater than this to pass the relevance filter.
pub const RELEVANCE_THRESHOLD: f64 = 0.4;

/// Earlier, precision-oriented threshold. Not used by default.
pub const STRICT_RELEVANCE_THRESHOLD: f64 = 0.65;

/// Default number of results returned by a query.
pub const DEFAULT_TOP_K: usize = 4;

/// Threshold and fallback rule applied to scored chunks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevancePolicy {
    /// Minimum score (exclusive)
    pub threshold: f64,

    /// Return the best chunks unfiltered when nothing passes the threshold
    pub fallback_to_best: bool,
}

impl Default for RelevancePolicy {
    fn default() -> Self {
        Self {
            threshold: RELEVANCE_THRESHOLD,
            fallback_to_best: true,
        }
    }
}

/// Cosine similarity of two vectors.
///
/// Vectors of different length are a caller error. A zero vector scores 0.0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> AppResult<f64> {
    if a.len() != b.len() {
        return Err(AppError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}

/// Rank every chunk in `snapshot` against `query`.
pub fn rank(
    snapshot: &StoreSnapshot,
    query: &[f64],
    top_k: usize,
    policy: RelevancePolicy,
) -> AppResult<Vec<SearchResult>> {
    if snapshot.is_empty() {
        tracing::debug!("Search on empty store");
        return Ok(Vec::new());
    }

    let mut scored: Vec<(f64, &Document, &Chunk)> = Vec::with_capacity(snapshot.chunk_count());
    for document in snapshot.documents() {
        for chunk in &document.chunks {
            let score = cosine_similarity(query, &chunk.vector)?;
            scored.push((score, document, chunk));
        }
    }

    let relevant: Vec<(f64, &Document, &Chunk)> = scored
        .iter()
        .filter(|(score, _, _)| *score > policy.threshold)
        .copied()
        .collect();

    let mut candidates = if relevant.is_empty() && policy.fallback_to_best {
        tracing::debug!(
            "No chunk above {:.2} among {}, falling back to best matches",
            policy.threshold,
            scored.len()
        );
        scored
    } else {
        relevant
    };

    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
    candidates.truncate(top_k);

    tracing::debug!(
        "Ranked {} chunks, returning {} (top score: {:?})",
        snapshot.chunk_count(),
        candidates.len(),
        candidates.first().map(|(score, _, _)| *score)
    );

    Ok(candidates
        .into_iter()
        .map(|(score, document, chunk)| SearchResult {
            text: chunk.text.clone(),
            score,
            document_id: document.id.clone(),
            document_metadata: document.metadata.clone(),
            chunk_id: chunk.id.clone(),
        })
        .collect())
}

/// Brute-force [`VectorIndex`] that scans the whole store on every query.
#[derive(Debug, Clone)]
pub struct BruteForceIndex {
    store: Arc<VectorStore>,
    policy: RelevancePolicy,
}

impl BruteForceIndex {
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self::with_policy(store, RelevancePolicy::default())
    }

    pub fn with_policy(store: Arc<VectorStore>, policy: RelevancePolicy) -> Self {
        Self { store, policy }
    }
}

#[async_trait::async_trait]
impl VectorIndex for BruteForceIndex {
    async fn search(&self, query: &[f64], top_k: usize) -> AppResult<Vec<SearchResult>> {
        let snapshot = self.store.snapshot().await?;
        rank(&snapshot, query, top_k, self.policy)
    }

    fn name(&self) -> &str {
        "brute-force"
    }
}
