//! Ingest command handler.
//!
//! Adds local files (directories are walked) and remote URLs to the store.
//! Each document is ingested on its own; one failure does not stop the rest.
//! Once something was stored, the embedding settings that produced it are
//! written to the workspace retrieval config.

use super::retrieval_config;
use clap::Args;
use manualqa_core::{config::AppConfig, AppError, AppResult};
use manualqa_retrieval::progress::{Phase, ProgressEvent, ProgressReporter};
use manualqa_retrieval::{config as retrieval, DocumentSource, RetrievalService};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// File extensions picked up when walking a directory.
const INGESTIBLE_EXTENSIONS: [&str; 6] = ["txt", "text", "md", "markdown", "html", "htm"];

/// Ingest manuals into the vector store
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Files or directories to ingest
    #[arg(long)]
    pub path: Vec<PathBuf>,

    /// URLs to download and ingest
    #[arg(long)]
    pub url: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");

        let mut sources = collect_sources(&self.path)?;
        sources.extend(self.url.iter().map(|url| DocumentSource::Remote(url.clone())));
        if sources.is_empty() {
            return Err(AppError::Config(
                "Nothing to ingest: pass --path or --url".to_string(),
            ));
        }

        let settings = retrieval_config(config)?;
        let mut service = RetrievalService::open(&config.workspace, &settings).await?;
        if !self.json {
            let report = |event: ProgressEvent| {
                let done = event.total.map_or(true, |total| event.current >= total);
                if event.phase != Phase::Embed || done {
                    eprintln!("{}", event.format_simple());
                }
            };
            service = service.with_progress(ProgressReporter::new(Arc::new(report)));
        }

        let mut ingested = Vec::new();
        let mut failures = Vec::new();
        for source in &sources {
            match service.ingest_source(source).await {
                Ok(result) => {
                    if !self.json {
                        println!(
                            "Ingested {} ({} chunks) as {}",
                            result.metadata.title, result.chunk_count, result.id
                        );
                    }
                    ingested.push(result);
                }
                Err(e) => {
                    tracing::error!("Failed to ingest {}: {}", source, e);
                    if !self.json {
                        eprintln!("Failed to ingest {}: {}", source, e);
                    }
                    failures.push(serde_json::json!({
                        "source": source.locator(),
                        "error": e.to_string(),
                    }));
                }
            }
        }

        if self.json {
            let output = serde_json::json!({
                "ingested": ingested,
                "failed": failures,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "{} of {} documents ingested",
                ingested.len(),
                sources.len()
            );
        }

        if ingested.is_empty() {
            return Err(AppError::Other(format!(
                "All {} documents failed to ingest",
                sources.len()
            )));
        }

        retrieval::save_config(&config.workspace, &settings)?;
        Ok(())
    }
}

/// Expand paths into sources. Directories contribute every file with a known
/// text extension, in sorted order; explicit files are taken as given.
fn collect_sources(paths: &[PathBuf]) -> AppResult<Vec<DocumentSource>> {
    let mut sources = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    AppError::Config(format!("Cannot walk {}: {}", path.display(), e))
                })?;
                if entry.file_type().is_file() && is_ingestible(entry.path()) {
                    sources.push(DocumentSource::Local(entry.into_path()));
                }
            }
        } else if path.exists() {
            sources.push(DocumentSource::Local(path.clone()));
        } else {
            return Err(AppError::Config(format!(
                "Path does not exist: {}",
                path.display()
            )));
        }
    }
    tracing::debug!("Collected {} local sources", sources.len());
    Ok(sources)
}

fn is_ingestible(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.starts_with('.'));
    let known = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| {
            INGESTIBLE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str())
        });
    !hidden && known
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_sources_walks_directories() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("kitchen");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join("router.md"), "# Router").unwrap();
        fs::write(nested.join("oven.txt"), "oven").unwrap();
        fs::write(nested.join("photo.png"), [0u8; 4]).unwrap();
        fs::write(temp.path().join(".notes.txt"), "hidden").unwrap();

        let sources = collect_sources(&[temp.path().to_path_buf()]).unwrap();
        let names: Vec<String> = sources.iter().map(|s| s.filename()).collect();
        assert_eq!(names, vec!["oven.txt", "router.md"]);
    }

    #[test]
    fn test_explicit_file_taken_as_given() {
        let temp = TempDir::new().unwrap();
        let pdf = temp.path().join("manual.pdf");
        fs::write(&pdf, b"%PDF").unwrap();

        let sources = collect_sources(&[pdf.clone()]).unwrap();
        assert_eq!(sources, vec![DocumentSource::Local(pdf)]);
    }

    #[tokio::test]
    async fn test_ingest_pins_embedding_settings() {
        let temp = TempDir::new().unwrap();
        let manual = temp.path().join("router.md");
        fs::write(&manual, "# Router\nHold reset for ten seconds.").unwrap();

        let app = AppConfig::default().with_overrides(
            Some(temp.path().to_path_buf()),
            None,
            None,
            None,
            None,
            false,
            false,
        );
        let command = IngestCommand {
            path: vec![manual],
            url: Vec::new(),
            json: true,
        };
        command.execute(&app).await.unwrap();

        let saved = retrieval::load_config(temp.path()).unwrap();
        assert_eq!(saved, retrieval_config(&app).unwrap());
        assert!(retrieval::get_config_path(temp.path()).exists());
    }

    #[tokio::test]
    async fn test_failed_ingest_writes_no_settings() {
        let temp = TempDir::new().unwrap();
        let manual = temp.path().join("broken.txt");
        fs::write(&manual, [0u8, 159, 146, 150]).unwrap();

        let app = AppConfig::default().with_overrides(
            Some(temp.path().to_path_buf()),
            None,
            None,
            None,
            None,
            false,
            false,
        );
        let command = IngestCommand {
            path: vec![manual],
            url: Vec::new(),
            json: true,
        };
        assert!(command.execute(&app).await.is_err());
        assert!(!retrieval::get_config_path(temp.path()).exists());
    }

    #[test]
    fn test_missing_path_is_error() {
        let result = collect_sources(&[PathBuf::from("/nonexistent/manuals")]);
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
