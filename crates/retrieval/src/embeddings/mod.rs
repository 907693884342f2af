//! Embedding providers.
//!
//! Ingestion and query both go through [`EmbeddingProvider`]; which
//! implementation is used comes from [`EmbeddingConfig`].

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{OllamaProvider, TrigramProvider};
