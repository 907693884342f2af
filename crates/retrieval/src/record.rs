//! Document record construction.
//!
//! Turns embedded chunks plus extractor metadata into a [`Document`] ready to
//! be upserted into the vector store.

use crate::types::{Chunk, Document, DocumentMetadata, OutlineEntry};
use chrono::{DateTime, SecondsFormat, Utc};
use manualqa_core::{AppError, AppResult};
use sha2::{Digest, Sha256};

/// Descriptive metadata known before ingestion completes.
#[derive(Debug, Clone, Default)]
pub struct MetadataSeed {
    pub filename: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub page_count: u32,
    pub source_locator: String,
    pub is_remote: bool,
    pub outline: Vec<OutlineEntry>,
}

/// Derive a document id from its source label and ingestion time.
///
/// Lowercase hex SHA-256 of the label followed by the nanosecond RFC 3339
/// timestamp, so ingesting the same file twice yields two ids.
pub fn document_id(source_label: &str, ingested_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_label.as_bytes());
    hasher.update(
        ingested_at
            .to_rfc3339_opts(SecondsFormat::Nanos, true)
            .as_bytes(),
    );
    format!("{:x}", hasher.finalize())
}

/// Chunk id for the chunk at `index`.
pub fn chunk_id(index: usize) -> String {
    format!("chunk-{}", index)
}

/// Builds [`Document`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentBuilder {
    expected_dimension: Option<usize>,
}

impl DocumentBuilder {
    /// Builder that accepts any dimension as long as all vectors agree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder that rejects vectors whose length is not `dimension`.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            expected_dimension: Some(dimension),
        }
    }

    /// Assemble a document from `(chunk text, vector)` pairs in chunk order.
    ///
    /// A vector of unexpected length, or one holding NaN or an infinity,
    /// fails the whole build with `AppError::EmbeddingProvider`; no partial
    /// document is produced.
    pub fn build(
        &self,
        source_label: &str,
        seed: MetadataSeed,
        ingested_at: DateTime<Utc>,
        embedded: Vec<(String, Vec<f64>)>,
    ) -> AppResult<Document> {
        let expected = self
            .expected_dimension
            .or_else(|| embedded.first().map(|(_, vector)| vector.len()));

        let mut chunks = Vec::with_capacity(embedded.len());
        for (index, (text, vector)) in embedded.into_iter().enumerate() {
            if let Some(expected) = expected {
                if vector.len() != expected {
                    return Err(AppError::EmbeddingProvider(format!(
                        "Embedding for {} of '{}' has {} dimensions, expected {}",
                        chunk_id(index),
                        source_label,
                        vector.len(),
                        expected
                    )));
                }
            }
            if !vector.iter().all(|x| x.is_finite()) {
                return Err(AppError::EmbeddingProvider(format!(
                    "Embedding for {} of '{}' contains a non-finite value",
                    chunk_id(index),
                    source_label
                )));
            }
            chunks.push(Chunk {
                id: chunk_id(index),
                text,
                vector,
            });
        }

        let title = seed
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| seed.filename.clone());

        let document = Document {
            id: document_id(source_label, ingested_at),
            metadata: DocumentMetadata {
                filename: seed.filename,
                title,
                author: seed.author.unwrap_or_default(),
                page_count: seed.page_count,
                created_at: ingested_at,
                source_locator: seed.source_locator,
                is_remote: seed.is_remote,
                outline: seed.outline,
            },
            chunks,
        };

        tracing::debug!(
            "Built document {} for '{}' with {} chunks",
            document.id,
            source_label,
            document.chunks.len()
        );

        Ok(document)
    }
}
