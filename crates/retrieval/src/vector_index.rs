//! Vector index abstraction.
//!
//! Anything that can rank stored chunks against a query vector. The default
//! implementation is the exact brute-force scan in [`crate::search`]; an
//! approximate index can be substituted without touching callers.

use crate::types::SearchResult;
use manualqa_core::AppResult;

/// Trait for similarity search backends.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return at most `top_k` results ordered by descending score.
    ///
    /// An empty store yields an empty vector, never an error.
    async fn search(&self, query: &[f64], top_k: usize) -> AppResult<Vec<SearchResult>>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}
