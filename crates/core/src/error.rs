//! Error types for manualqa.
//!
//! One enum covers every failure category of the retrieval engine: document
//! extraction, embedding calls, persistence of the vector store and vector
//! shape violations, plus the usual configuration and I/O errors.

use thiserror::Error;

/// Unified error type for manualqa.
///
/// An empty vector store is not an error; callers observe it as an empty
/// result set (see `Retrieval::EmptyStore` in the retrieval crate).
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors outside the vector store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source document could not be read or parsed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Embedding provider call failed or returned a malformed vector
    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(String),

    /// Vector store could not be written to (or read from) disk
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Two vectors of different dimensionality were compared
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Remote document download failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
