//! List command handler.

use super::open_service;
use clap::Args;
use manualqa_core::{config::AppConfig, AppResult};

/// List ingested manuals
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing list command");

        let documents = open_service(config).await?.list_documents().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&documents)?);
            return Ok(());
        }

        if documents.is_empty() {
            println!("No manuals ingested");
            return Ok(());
        }

        for document in &documents {
            let meta = &document.metadata;
            println!("{}  {}", document.id, meta.title);
            println!(
                "    {} pages, {} chunks, ingested {}",
                meta.page_count,
                document.chunk_count,
                meta.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("    {}", meta.source_locator);
        }

        Ok(())
    }
}
