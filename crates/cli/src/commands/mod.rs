//! Command handlers for the manualqa CLI.

pub mod clear;
pub mod ingest;
pub mod list;
pub mod query;
pub mod stats;

pub use clear::ClearCommand;
pub use ingest::IngestCommand;
pub use list::ListCommand;
pub use query::QueryCommand;
pub use stats::StatsCommand;

use manualqa_core::{config::AppConfig, AppResult};
use manualqa_retrieval::{config, EmbeddingConfig, RetrievalConfig, RetrievalService};

/// Model used when `--provider ollama` is given without `--model`.
const DEFAULT_OLLAMA_MODEL: &str = "nomic-embed-text";
const DEFAULT_OLLAMA_DIMENSIONS: usize = 768;

/// Workspace retrieval settings with the global provider/model flags applied.
pub fn retrieval_config(app: &AppConfig) -> AppResult<RetrievalConfig> {
    let mut settings = config::load_config(&app.workspace)?;

    if let Some(provider) = &app.embedding_provider {
        if *provider != settings.embedding.provider {
            settings.embedding = match provider.as_str() {
                "ollama" => {
                    EmbeddingConfig::ollama(DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_DIMENSIONS)
                }
                _ => EmbeddingConfig {
                    provider: provider.clone(),
                    ..EmbeddingConfig::default()
                },
            };
        }
    }
    if let Some(model) = &app.embedding_model {
        settings.embedding.model = model.clone();
    }

    settings.validate()?;
    Ok(settings)
}

pub async fn open_service(app: &AppConfig) -> AppResult<RetrievalService> {
    let settings = retrieval_config(app)?;
    RetrievalService::open(&app.workspace, &settings).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn app_config(workspace: &std::path::Path) -> AppConfig {
        AppConfig::default().with_overrides(
            Some(workspace.to_path_buf()),
            None,
            None,
            None,
            None,
            false,
            false,
        )
    }

    #[test]
    fn test_defaults_without_overrides() {
        let temp = TempDir::new().unwrap();
        let settings = retrieval_config(&app_config(temp.path())).unwrap();
        assert_eq!(settings, RetrievalConfig::default());
    }

    #[test]
    fn test_provider_override_switches_embedding() {
        let temp = TempDir::new().unwrap();
        let mut app = app_config(temp.path());
        app.embedding_provider = Some("ollama".to_string());
        app.embedding_model = Some("mxbai-embed-large".to_string());

        let settings = retrieval_config(&app).unwrap();
        assert_eq!(settings.embedding.provider, "ollama");
        assert_eq!(settings.embedding.model, "mxbai-embed-large");
        assert_eq!(settings.embedding.dimensions, 768);
    }
}
