//! Clear command handler.

use super::open_service;
use clap::Args;
use manualqa_core::{config::AppConfig, AppError, AppResult};

/// Remove every ingested manual
#[derive(Args, Debug)]
pub struct ClearCommand {
    /// Confirm removal
    #[arg(short, long)]
    pub yes: bool,
}

impl ClearCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing clear command");

        if !self.yes {
            return Err(AppError::Config(
                "Refusing to clear the vector store without --yes".to_string(),
            ));
        }

        let service = open_service(config).await?;
        let removed = service.stats().await?.document_count;
        service.clear().await?;

        println!("Removed {} manuals", removed);
        Ok(())
    }
}
