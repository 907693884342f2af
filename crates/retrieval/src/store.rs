//! Persistent vector store.
//!
//! All documents live in one JSON file: an object keyed by document id whose
//! values hold the document's `chunks` and `info` (metadata). The file is
//! read lazily on first access and then served from memory; every mutation
//! rewrites the whole file.
//!
//! Readers work on an immutable [`StoreSnapshot`] behind an `Arc`. Writers
//! are serialized by a mutex around load-mutate-persist, and the new snapshot
//! is only published once the file write succeeded.

use crate::types::{Chunk, Document, DocumentSummary};
use indexmap::IndexMap;
use manualqa_core::{AppError, AppResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Immutable view of every stored document, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    documents: IndexMap<String, Document>,
}

impl StoreSnapshot {
    /// Documents in scan order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.documents.values().map(|d| d.chunks.len()).sum()
    }

    /// True when no chunk exists in any document.
    pub fn is_empty(&self) -> bool {
        self.chunk_count() == 0
    }

    /// Vector length shared by stored chunks, ignoring document `except`.
    fn dimension_excluding(&self, except: &str) -> Option<usize> {
        self.documents
            .values()
            .filter(|d| d.id != except)
            .flat_map(|d| d.chunks.first())
            .map(|c| c.vector.len())
            .next()
    }
}

/// Counters reported by [`VectorStore::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub document_count: usize,
    pub chunk_count: usize,
    pub file_size_bytes: u64,
}

/// The authoritative collection of documents and their chunk vectors.
#[derive(Debug)]
pub struct VectorStore {
    path: PathBuf,
    snapshot: RwLock<Option<Arc<StoreSnapshot>>>,
    writer: Mutex<()>,
}

impl VectorStore {
    /// Create a store backed by `path`. Nothing is read until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: RwLock::new(None),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store from disk once; later calls return the cached snapshot.
    ///
    /// A missing file yields an empty store. A file that cannot be parsed is
    /// moved aside to `<file>.corrupt` and the store starts empty.
    pub async fn load(&self) -> AppResult<Arc<StoreSnapshot>> {
        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let _guard = self.writer.lock().await;
        self.loaded().await
    }

    /// Current snapshot, reading the file if needed. Caller holds `writer`.
    async fn loaded(&self) -> AppResult<Arc<StoreSnapshot>> {
        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let snapshot = Arc::new(self.read_file().await?);
        tracing::info!(
            "Loaded vector store from {:?}: {} documents, {} chunks",
            self.path,
            snapshot.document_count(),
            snapshot.chunk_count()
        );

        *self.snapshot.write().await = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    async fn read_file(&self) -> AppResult<StoreSnapshot> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No vector store at {:?}, starting empty", self.path);
                return Ok(StoreSnapshot::default());
            }
            Err(e) => {
                return Err(AppError::Persistence(format!(
                    "Failed to read vector store {:?}: {}",
                    self.path, e
                )))
            }
        };

        match decode(&bytes) {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                let backup = self.sibling("corrupt");
                tracing::warn!(
                    "Vector store {:?} is unreadable ({}), moving it to {:?} and starting empty",
                    self.path,
                    e,
                    backup
                );
                if let Err(e) = tokio::fs::rename(&self.path, &backup).await {
                    tracing::warn!("Could not move corrupt vector store aside: {}", e);
                }
                Ok(StoreSnapshot::default())
            }
        }
    }

    /// Insert or wholesale-replace a document, then persist the entire store.
    ///
    /// A document whose vectors differ in length from the ones already
    /// stored is rejected with `AppError::DimensionMismatch`. When the write
    /// fails the in-memory store is left untouched and the error is returned
    /// as `AppError::Persistence`.
    pub async fn upsert(&self, document: Document) -> AppResult<()> {
        let _guard = self.writer.lock().await;
        let current = self.loaded().await?;

        if let Some(expected) = current.dimension_excluding(&document.id) {
            if let Some(chunk) = document.chunks.iter().find(|c| c.vector.len() != expected) {
                tracing::warn!(
                    "Rejecting document {}: {} has {} dimensions, store holds {}",
                    document.id,
                    chunk.id,
                    chunk.vector.len(),
                    expected
                );
                return Err(AppError::DimensionMismatch {
                    expected,
                    actual: chunk.vector.len(),
                });
            }
        }

        let mut next = StoreSnapshot::clone(&current);
        let id = document.id.clone();
        let chunk_count = document.chunks.len();
        let replaced = next.documents.insert(id.clone(), document).is_some();

        self.persist(&next).await?;
        *self.snapshot.write().await = Some(Arc::new(next));

        tracing::info!(
            document_id = %id,
            chunks = chunk_count,
            replaced,
            "Upserted document"
        );
        Ok(())
    }

    /// Remove every document and persist the empty store.
    pub async fn clear(&self) -> AppResult<()> {
        let _guard = self.writer.lock().await;
        let empty = StoreSnapshot::default();

        self.persist(&empty).await?;
        *self.snapshot.write().await = Some(Arc::new(empty));

        tracing::info!("Cleared vector store {:?}", self.path);
        Ok(())
    }

    /// The current snapshot (loading it if necessary).
    pub async fn snapshot(&self) -> AppResult<Arc<StoreSnapshot>> {
        self.load().await
    }

    /// Every document with its metadata and chunk count, without vectors.
    pub async fn catalog(&self) -> AppResult<Vec<DocumentSummary>> {
        let snapshot = self.load().await?;
        Ok(snapshot
            .documents()
            .map(|document| DocumentSummary {
                id: document.id.clone(),
                metadata: document.metadata.clone(),
                chunk_count: document.chunks.len(),
            })
            .collect())
    }

    /// Every chunk of every document, in scan order.
    pub async fn all_chunks_flat(&self) -> AppResult<Vec<Chunk>> {
        let snapshot = self.load().await?;
        Ok(snapshot
            .documents()
            .flat_map(|document| document.chunks.iter().cloned())
            .collect())
    }

    /// Look up one document by id.
    pub async fn document(&self, id: &str) -> AppResult<Option<Document>> {
        let snapshot = self.load().await?;
        Ok(snapshot.get(id).cloned())
    }

    /// Document/chunk counts and the size of the backing file.
    pub async fn stats(&self) -> AppResult<StoreStats> {
        let snapshot = self.load().await?;
        let file_size_bytes = tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStats {
            document_count: snapshot.document_count(),
            chunk_count: snapshot.chunk_count(),
            file_size_bytes,
        })
    }

    /// Write the snapshot to a temporary sibling file and rename it over the store.
    async fn persist(&self, snapshot: &StoreSnapshot) -> AppResult<()> {
        let bytes = serde_json::to_vec(&snapshot.documents).map_err(|e| {
            AppError::Persistence(format!("Failed to serialize vector store: {}", e))
        })?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Persistence(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }

        let temp_path = self.sibling("tmp");
        tokio::fs::write(&temp_path, &bytes).await.map_err(|e| {
            AppError::Persistence(format!("Failed to write {:?}: {}", temp_path, e))
        })?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| {
                AppError::Persistence(format!(
                    "Failed to move {:?} over {:?}: {}",
                    temp_path, self.path, e
                ))
            })?;

        tracing::debug!(
            "Persisted {} documents ({} bytes) to {:?}",
            snapshot.document_count(),
            bytes.len(),
            self.path
        );
        Ok(())
    }

    /// `<store file>.<suffix>` next to the store file.
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }
}

fn decode(bytes: &[u8]) -> AppResult<StoreSnapshot> {
    let mut documents: IndexMap<String, Document> = serde_json::from_slice(bytes)?;
    for (id, document) in documents.iter_mut() {
        document.id = id.clone();
    }
    Ok(StoreSnapshot { documents })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentMetadata;
    use chrono::Utc;
    use tempfile::TempDir;

    fn document(id: &str, vectors: &[Vec<f64>]) -> Document {
        Document {
            id: id.to_string(),
            metadata: DocumentMetadata {
                filename: format!("{}.pdf", id),
                title: format!("Manual {}", id),
                author: String::new(),
                page_count: 3,
                created_at: Utc::now(),
                source_locator: format!("/manuals/{}.pdf", id),
                is_remote: false,
                outline: Vec::new(),
            },
            chunks: vectors
                .iter()
                .enumerate()
                .map(|(i, v)| Chunk {
                    id: format!("chunk-{}", i),
                    text: format!("{} text {}", id, i),
                    vector: v.clone(),
                })
                .collect(),
        }
    }

    fn store_in(temp: &TempDir) -> VectorStore {
        VectorStore::new(temp.path().join("store").join("vectors.json"))
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let snapshot = store.load().await.unwrap();
        assert_eq!(snapshot.document_count(), 0);
        assert!(snapshot.is_empty());
        assert!(store.catalog().await.unwrap().is_empty());
        assert!(store.all_chunks_flat().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_vectors_bit_for_bit() {
        let temp = TempDir::new().unwrap();
        let vectors = vec![
            vec![0.1, -0.2, 1.0 / 3.0],
            vec![f64::MIN_POSITIVE, 1e-300, 0.30000000000000004],
        ];
        let original = document("a", &vectors);

        let store = store_in(&temp);
        store.upsert(original.clone()).await.unwrap();

        let reopened = store_in(&temp);
        let loaded = reopened.document("a").await.unwrap().unwrap();
        assert_eq!(loaded.metadata, original.metadata);
        for (loaded_chunk, original_chunk) in loaded.chunks.iter().zip(&original.chunks) {
            let loaded_bits: Vec<u64> = loaded_chunk.vector.iter().map(|x| x.to_bits()).collect();
            let original_bits: Vec<u64> =
                original_chunk.vector.iter().map(|x| x.to_bits()).collect();
            assert_eq!(loaded_bits, original_bits);
        }
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn test_file_layout() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.upsert(document("a", &[vec![1.0, 0.0]])).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["a"]["chunks"][0]["id"], "chunk-0");
        assert_eq!(value["a"]["chunks"][0]["vector"][0], 1.0);
        assert_eq!(value["a"]["info"]["pageCount"], 3);
        assert_eq!(value["a"]["info"]["isRemote"], false);
    }

    #[tokio::test]
    async fn test_upsert_replaces_wholesale_and_keeps_position() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.upsert(document("a", &[vec![1.0], vec![2.0]])).await.unwrap();
        store.upsert(document("b", &[vec![3.0]])).await.unwrap();
        store.upsert(document("a", &[vec![4.0]])).await.unwrap();

        let catalog = store.catalog().await.unwrap();
        let ids: Vec<&str> = catalog.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(catalog[0].chunk_count, 1);
        assert_eq!(store.all_chunks_flat().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_multi_document_isolation() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        let a = document("a", &[vec![1.0, 0.0], vec![0.0, 1.0]]);
        store.upsert(a.clone()).await.unwrap();
        store.upsert(document("b", &[vec![0.5, 0.5]])).await.unwrap();

        assert_eq!(store.document("a").await.unwrap(), Some(a.clone()));
        let reopened = store_in(&temp);
        assert_eq!(reopened.document("a").await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn test_corrupt_file_moved_aside() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), b"{ not json").unwrap();

        let snapshot = store.load().await.unwrap();
        assert_eq!(snapshot.document_count(), 0);
        assert!(store.sibling("corrupt").exists());
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_memory_untouched() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.upsert(document("a", &[vec![1.0]])).await.unwrap();

        // A directory where the temp file should go makes the write fail.
        std::fs::create_dir_all(store.sibling("tmp")).unwrap();
        let result = store.upsert(document("b", &[vec![2.0]])).await;
        assert!(matches!(result, Err(AppError::Persistence(_))));

        let ids: Vec<String> = store
            .catalog()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["a".to_string()]);

        std::fs::remove_dir(store.sibling("tmp")).unwrap();
        let reopened = store_in(&temp);
        assert_eq!(reopened.load().await.unwrap().document_count(), 1);
    }

    #[tokio::test]
    async fn test_upsert_rejects_other_dimension() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store
            .upsert(document("a", &[vec![1.0, 0.0, 0.0]]))
            .await
            .unwrap();

        let result = store.upsert(document("b", &[vec![1.0, 0.0]])).await;
        assert!(matches!(
            result,
            Err(AppError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));

        let ids: Vec<String> = store
            .catalog()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["a".to_string()]);
        let reopened = store_in(&temp);
        assert_eq!(reopened.load().await.unwrap().document_count(), 1);

        // Replacing the only document may change the dimension.
        store.upsert(document("a", &[vec![1.0, 0.0]])).await.unwrap();
        store.upsert(document("b", &[vec![0.0, 1.0]])).await.unwrap();
        assert_eq!(store.load().await.unwrap().document_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_are_serialized() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(store_in(&temp));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .upsert(document(&format!("doc{}", i), &[vec![i as f64]]))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.load().await.unwrap().document_count(), 16);
        let reopened = store_in(&temp);
        assert_eq!(reopened.load().await.unwrap().document_count(), 16);
    }

    #[tokio::test]
    async fn test_clear_and_stats() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        store.upsert(document("a", &[vec![1.0], vec![2.0]])).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.document_count, 1);
        assert_eq!(stats.chunk_count, 2);
        assert!(stats.file_size_bytes > 0);

        store.clear().await.unwrap();
        assert_eq!(store.stats().await.unwrap().document_count, 0);
        let reopened = store_in(&temp);
        assert!(reopened.load().await.unwrap().is_empty());
    }
}
