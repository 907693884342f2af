//! Query command handler.

use super::open_service;
use clap::Args;
use manualqa_core::{config::AppConfig, AppResult};
use manualqa_retrieval::attribution::truncate_snippet;
use manualqa_retrieval::Retrieval;

const PREVIEW_LENGTH: usize = 300;

/// Search the ingested manuals
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// Question or search text
    pub text: String,

    /// Number of chunks to return (default from retrieval.yaml)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing query command");

        let service = open_service(config).await?;
        let k = self.top_k.unwrap_or_else(|| service.top_k());
        let retrieval = service.retrieve(&self.text, k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&retrieval)?);
            return Ok(());
        }

        match retrieval {
            Retrieval::EmptyStore => {
                println!("No manuals ingested yet. Run `manualqa ingest --path <file>` first.");
            }
            Retrieval::Matches {
                results,
                most_relevant,
            } => {
                for (rank, result) in results.iter().enumerate() {
                    println!(
                        "{}. [{:.3}] {} ({})",
                        rank + 1,
                        result.score,
                        result.document_metadata.title,
                        result.chunk_id
                    );
                    println!("   {}", truncate_snippet(&result.text, PREVIEW_LENGTH));
                    println!();
                }

                if let Some(citation) = most_relevant {
                    let kind = if citation.is_remote { "url" } else { "file" };
                    println!("Most relevant manual: {}", citation.title);
                    println!("  {}: {}", kind, citation.source_locator);
                    println!("  \"{}\"", citation.snippet);
                }
            }
        }

        Ok(())
    }
}
