//! Embedding retrieval engine for product manuals.
//!
//! Documents are split into overlapping word windows, embedded, and kept in a
//! single JSON-backed vector store. Questions are answered by exact cosine
//! search over every stored chunk.
//!
//! Most callers only need [`RetrievalService`]:
//!
//! ```no_run
//! # async fn demo() -> manualqa_core::AppResult<()> {
//! use manualqa_retrieval::{config, DocumentSource, Retrieval, RetrievalService};
//!
//! let workspace = std::path::Path::new(".");
//! let settings = config::load_config(workspace)?;
//! let service = RetrievalService::open(workspace, &settings).await?;
//!
//! service
//!     .ingest_source(&DocumentSource::parse("manuals/router.md"))
//!     .await?;
//!
//! if let Retrieval::Matches { results, .. } = service.retrieve("reset the router", 4).await? {
//!     println!("best match: {}", results[0].text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod attribution;
pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod extract;
pub mod progress;
pub mod record;
pub mod search;
pub mod service;
pub mod source;
pub mod store;
pub mod types;
pub mod vector_index;

pub use attribution::Citation;
pub use chunker::Chunker;
pub use config::RetrievalConfig;
pub use embeddings::{EmbeddingConfig, EmbeddingProvider};
pub use extract::{ExtractedText, PlainTextExtractor, TextExtractor};
pub use search::{BruteForceIndex, RelevancePolicy};
pub use service::{Retrieval, RetrievalService};
pub use source::DocumentSource;
pub use store::{StoreSnapshot, StoreStats, VectorStore};
pub use types::{
    Chunk, Document, DocumentIngestResult, DocumentMetadata, DocumentSummary, OutlineEntry,
    SearchResult,
};
pub use vector_index::VectorIndex;
