//! Retrieval engine type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One section heading from a document outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineEntry {
    /// Section title
    pub title: String,

    /// Approximate 1-based page the section starts on
    pub page_number: u32,
}

/// Provenance and display information for an ingested document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// File name as shown to users
    pub filename: String,

    /// Document title (falls back to the file name)
    pub title: String,

    /// Author, empty when unknown
    #[serde(default)]
    pub author: String,

    /// Number of pages reported by the extractor
    pub page_count: u32,

    /// Ingestion timestamp
    pub created_at: DateTime<Utc>,

    /// Local path or remote URL the bytes came from
    pub source_locator: String,

    /// Whether `source_locator` is a URL
    pub is_remote: bool,

    /// Section list, empty when the extractor found none
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outline: Vec<OutlineEntry>,
}

/// A text window of a document paired with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// `chunk-<index>`, unique within its document only
    pub id: String,

    /// Chunk text (with section prefix, if any)
    pub text: String,

    /// Embedding vector
    pub vector: Vec<f64>,
}

/// An ingested document with all of its chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Globally unique document identifier
    #[serde(skip)]
    pub id: String,

    /// Descriptive metadata
    #[serde(rename = "info")]
    pub metadata: DocumentMetadata,

    /// Chunks in document order
    pub chunks: Vec<Chunk>,
}

/// Catalog entry: a document without its vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub metadata: DocumentMetadata,
    pub chunk_count: usize,
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentIngestResult {
    pub id: String,
    pub chunk_count: usize,
    pub metadata: DocumentMetadata,
}

/// A scored chunk returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Chunk text
    pub text: String,

    /// Cosine similarity with the query, in [-1, 1]
    pub score: f64,

    /// Owning document
    pub document_id: String,

    /// Owning document's metadata
    pub document_metadata: DocumentMetadata,

    /// Chunk id within the owning document
    pub chunk_id: String,
}
