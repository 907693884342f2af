//! Retrieval settings and on-disk layout.
//!
//! Settings live in `.manualqa/retrieval.yaml`; the vector store lives in
//! `.manualqa/store/vectors.json`. A missing settings file means defaults.

use crate::chunker::{Chunker, DEFAULT_OVERLAP_WORDS, DEFAULT_WINDOW_WORDS};
use crate::embeddings::EmbeddingConfig;
use crate::search::{RelevancePolicy, DEFAULT_TOP_K, RELEVANCE_THRESHOLD};
use manualqa_core::config::DATA_DIR_NAME;
use manualqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default cap on remote document downloads (50 MiB).
pub const DEFAULT_MAX_REMOTE_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Words per chunk window
    pub chunk_words: usize,

    /// Words shared by consecutive windows
    pub chunk_overlap: usize,

    pub top_k: usize,

    /// Scores must exceed this to count as relevant
    pub relevance_threshold: f64,

    pub max_remote_bytes: u64,

    pub embedding: EmbeddingConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_words: DEFAULT_WINDOW_WORDS,
            chunk_overlap: DEFAULT_OVERLAP_WORDS,
            top_k: DEFAULT_TOP_K,
            relevance_threshold: RELEVANCE_THRESHOLD,
            max_remote_bytes: DEFAULT_MAX_REMOTE_BYTES,
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl RetrievalConfig {
    /// Chunker for these settings. Fails when the overlap is not smaller than the window.
    pub fn chunker(&self) -> AppResult<Chunker> {
        Chunker::new(self.chunk_words, self.chunk_overlap)
    }

    pub fn relevance_policy(&self) -> RelevancePolicy {
        RelevancePolicy {
            threshold: self.relevance_threshold,
            ..RelevancePolicy::default()
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        self.chunker()?;
        if self.top_k == 0 {
            return Err(AppError::Config("top_k must be at least 1".to_string()));
        }
        if !self.relevance_threshold.is_finite() {
            return Err(AppError::Config(
                "relevance_threshold must be a finite number".to_string(),
            ));
        }
        self.embedding.validate()
    }
}

/// Load retrieval settings for a workspace, falling back to defaults.
pub fn load_config(workspace: &Path) -> AppResult<RetrievalConfig> {
    let config_path = get_config_path(workspace);

    if !config_path.exists() {
        tracing::debug!("No retrieval config at {:?}, using defaults", config_path);
        return Ok(RetrievalConfig::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let config: RetrievalConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;

    config.validate()?;
    tracing::debug!("Loaded retrieval config from {:?}", config_path);
    Ok(config)
}

pub fn save_config(workspace: &Path, config: &RetrievalConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let yaml = serde_yaml::to_string(config)?;
    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Config(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved retrieval config to {:?}", config_path);
    Ok(())
}

pub fn get_data_dir(workspace: &Path) -> PathBuf {
    workspace.join(DATA_DIR_NAME)
}

pub fn get_config_path(workspace: &Path) -> PathBuf {
    get_data_dir(workspace).join("retrieval.yaml")
}

/// Path of the persisted vector store.
pub fn get_store_path(workspace: &Path) -> PathBuf {
    get_data_dir(workspace).join("store").join("vectors.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path()).unwrap();

        assert_eq!(config.chunk_words, 500);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.top_k, 4);
        assert_eq!(config.relevance_threshold, 0.4);
        assert_eq!(config.max_remote_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let config = RetrievalConfig {
            chunk_words: 200,
            chunk_overlap: 20,
            embedding: EmbeddingConfig::ollama("nomic-embed-text", 768),
            ..Default::default()
        };

        save_config(temp.path(), &config).unwrap();
        assert_eq!(load_config(temp.path()).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = get_config_path(temp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "top_k: 8\n").unwrap();

        let config = load_config(temp.path()).unwrap();
        assert_eq!(config.top_k, 8);
        assert_eq!(config.chunk_words, 500);
        assert_eq!(config.embedding, EmbeddingConfig::default());
    }

    #[test]
    fn test_overlap_not_smaller_than_window_rejected() {
        let config = RetrievalConfig {
            chunk_words: 50,
            chunk_overlap: 50,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_paths() {
        let workspace = Path::new("/work");
        assert_eq!(
            get_store_path(workspace),
            PathBuf::from("/work/.manualqa/store/vectors.json")
        );
        assert_eq!(
            get_config_path(workspace),
            PathBuf::from("/work/.manualqa/retrieval.yaml")
        );
    }
}
