//! Retrieval service facade.
//!
//! Ties the pieces together: a document goes through extraction, chunking,
//! one embedding call per chunk and record building before it is upserted
//! into the vector store. Queries are embedded with the same provider and
//! ranked by the configured [`VectorIndex`].
//!
//! Ingestion is all-or-nothing. Any failure before the upsert leaves the
//! store exactly as it was.

use crate::attribution::{self, Citation};
use crate::chunker::Chunker;
use crate::config::{get_store_path, RetrievalConfig};
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::extract::{PlainTextExtractor, TextExtractor};
use crate::progress::ProgressReporter;
use crate::record::{DocumentBuilder, MetadataSeed};
use crate::search::BruteForceIndex;
use crate::source::DocumentSource;
use crate::store::{StoreStats, VectorStore};
use crate::types::{DocumentIngestResult, DocumentSummary, OutlineEntry, SearchResult};
use crate::vector_index::VectorIndex;
use chrono::Utc;
use manualqa_core::{AppError, AppResult};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Outcome of [`RetrievalService::retrieve`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Retrieval {
    /// Nothing has been ingested yet
    EmptyStore,

    /// Ranked chunks plus the document most of them came from
    #[serde(rename_all = "camelCase")]
    Matches {
        results: Vec<SearchResult>,
        most_relevant: Option<Citation>,
    },
}

pub struct RetrievalService {
    store: Arc<VectorStore>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    extractor: Arc<dyn TextExtractor>,
    chunker: Chunker,
    builder: DocumentBuilder,
    top_k: usize,
    max_remote_bytes: u64,
    progress: ProgressReporter,
}

impl std::fmt::Debug for RetrievalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalService")
            .field("store", &self.store.path())
            .field("index", &self.index.name())
            .field("embedder", &self.embedder)
            .field("chunker", &self.chunker)
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl RetrievalService {
    /// Build a service over `store` with the plain-text extractor and the
    /// brute-force index.
    pub fn new(
        store: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &RetrievalConfig,
    ) -> AppResult<Self> {
        config.validate()?;

        let index = BruteForceIndex::with_policy(Arc::clone(&store), config.relevance_policy());
        Ok(Self {
            store,
            index: Arc::new(index),
            builder: DocumentBuilder::with_dimension(embedder.dimensions()),
            embedder,
            extractor: Arc::new(PlainTextExtractor::new()),
            chunker: config.chunker()?,
            top_k: config.top_k,
            max_remote_bytes: config.max_remote_bytes,
            progress: ProgressReporter::noop(),
        })
    }

    /// Open the workspace store, creating the embedding provider from
    /// `config` and loading persisted documents.
    pub async fn open(workspace: &Path, config: &RetrievalConfig) -> AppResult<Self> {
        let store = Arc::new(VectorStore::new(get_store_path(workspace)));
        store.load().await?;

        let embedder = create_provider(&config.embedding)?;
        tracing::info!(
            "Opened retrieval service at {:?} (provider: {}, model: {})",
            workspace,
            embedder.provider_name(),
            embedder.model_name()
        );

        Self::new(store, embedder, config)
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = index;
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// Default number of results per query.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Ingest already-fetched document bytes.
    #[tracing::instrument(skip(self, bytes, source), fields(source = %source, bytes = bytes.len()))]
    pub async fn ingest_document(
        &self,
        bytes: &[u8],
        source: &DocumentSource,
    ) -> AppResult<DocumentIngestResult> {
        let filename = source.filename();
        let extracted = self.extractor.extract(bytes, &filename)?;
        self.progress.extract(&filename, extracted.page_count);

        // Outline pages are 1-based; section placement counts the pages before it.
        let section_starts: Vec<OutlineEntry> = extracted
            .outline
            .iter()
            .map(|entry| OutlineEntry {
                title: entry.title.clone(),
                page_number: entry.page_number.saturating_sub(1),
            })
            .collect();
        let texts = self.chunker.chunk_with_outline(
            &extracted.text,
            &section_starts,
            extracted.page_count,
        );
        self.progress.chunk(texts.len());

        let total = texts.len();
        let mut embedded = Vec::with_capacity(total);
        for (i, text) in texts.into_iter().enumerate() {
            let vector = self.embedder.embed(&text).await.map_err(|e| {
                tracing::warn!("Embedding chunk {} of {} failed: {}", i, source, e);
                match e {
                    AppError::EmbeddingProvider(_) => e,
                    other => AppError::EmbeddingProvider(other.to_string()),
                }
            })?;
            embedded.push((text, vector));
            self.progress.embed(i + 1, total, self.embedder.model_name());
        }

        let seed = MetadataSeed {
            filename,
            title: extracted.title,
            author: extracted.author,
            page_count: extracted.page_count,
            source_locator: source.locator(),
            is_remote: source.is_remote(),
            outline: extracted.outline,
        };
        let document = self
            .builder
            .build(&source.locator(), seed, Utc::now(), embedded)?;

        let result = DocumentIngestResult {
            id: document.id.clone(),
            chunk_count: document.chunks.len(),
            metadata: document.metadata.clone(),
        };

        self.store.upsert(document).await?;
        self.progress.persist(&result.id);

        tracing::info!(
            document_id = %result.id,
            chunks = result.chunk_count,
            "Ingested '{}'",
            result.metadata.title
        );
        Ok(result)
    }

    /// Fetch a document from its source, then ingest it.
    pub async fn ingest_source(&self, source: &DocumentSource) -> AppResult<DocumentIngestResult> {
        let bytes = source.fetch(self.max_remote_bytes).await?;
        self.ingest_document(&bytes, source).await
    }

    /// Top `k` chunks for `text`. Empty when nothing has been ingested.
    #[tracing::instrument(skip(self, text), fields(query_len = text.len()))]
    pub async fn query(&self, text: &str, k: usize) -> AppResult<Vec<SearchResult>> {
        if !self.is_populated().await? {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(text).await?;
        let results = self.index.search(&vector, k).await?;

        tracing::debug!(
            "Query returned {} results from {}",
            results.len(),
            self.index.name()
        );
        Ok(results)
    }

    /// Like [`query`](Self::query), but tells an empty store apart from a
    /// query with matches and attributes the results to a document.
    pub async fn retrieve(&self, text: &str, k: usize) -> AppResult<Retrieval> {
        if !self.is_populated().await? {
            tracing::info!("Retrieval requested on an empty store");
            return Ok(Retrieval::EmptyStore);
        }

        let results = self.query(text, k).await?;
        let most_relevant = attribution::cite(&results);
        Ok(Retrieval::Matches {
            results,
            most_relevant,
        })
    }

    pub async fn list_documents(&self) -> AppResult<Vec<DocumentSummary>> {
        self.store.catalog().await
    }

    /// True once at least one chunk is stored.
    pub async fn is_populated(&self) -> AppResult<bool> {
        Ok(!self.store.snapshot().await?.is_empty())
    }

    pub async fn clear(&self) -> AppResult<()> {
        self.store.clear().await
    }

    pub async fn stats(&self) -> AppResult<StoreStats> {
        self.store.stats().await
    }

    /// Id of the document contributing the most results.
    pub fn most_relevant_document(results: &[SearchResult]) -> Option<&str> {
        attribution::most_relevant_document(results)
    }
}
