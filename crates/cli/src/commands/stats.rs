//! Stats command handler.

use super::{open_service, retrieval_config};
use clap::Args;
use manualqa_core::{config::AppConfig, AppResult};

/// Show vector store statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let settings = retrieval_config(config)?;
        let service = open_service(config).await?;
        let stats = service.stats().await?;
        let store_path = service.store().path().display().to_string();

        if self.json {
            let output = serde_json::json!({
                "storePath": store_path,
                "documentCount": stats.document_count,
                "chunkCount": stats.chunk_count,
                "fileSizeBytes": stats.file_size_bytes,
                "embeddingProvider": settings.embedding.provider,
                "embeddingModel": settings.embedding.model,
                "dimensions": settings.embedding.dimensions,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Vector store: {}", store_path);
            println!("  Documents: {}", stats.document_count);
            println!("  Chunks: {}", stats.chunk_count);
            println!("  File size: {} bytes", stats.file_size_bytes);
            println!(
                "  Embeddings: {} / {} ({} dims)",
                settings.embedding.provider, settings.embedding.model, settings.embedding.dimensions
            );
        }

        Ok(())
    }
}
