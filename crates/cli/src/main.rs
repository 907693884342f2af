//! manualqa CLI
//!
//! Ingest product manuals and search them by meaning.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ClearCommand, IngestCommand, ListCommand, QueryCommand, StatsCommand};
use manualqa_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// manualqa - semantic search over product manuals
#[derive(Parser, Debug)]
#[command(name = "manualqa")]
#[command(about = "Semantic search over product manuals", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "MANUALQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "MANUALQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Embedding provider (trigram, ollama)
    #[arg(short, long, global = true, env = "MANUALQA_EMBEDDING_PROVIDER")]
    provider: Option<String>,

    /// Embedding model identifier
    #[arg(short, long, global = true, env = "MANUALQA_EMBEDDING_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest manuals from files, directories or URLs
    Ingest(IngestCommand),

    /// Search the ingested manuals
    Query(QueryCommand),

    /// List ingested manuals
    List(ListCommand),

    /// Show vector store statistics
    Stats(StatsCommand),

    /// Remove every ingested manual
    Clear(ClearCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ingest(_) => "ingest",
            Commands::Query(_) => "query",
            Commands::List(_) => "list",
            Commands::Stats(_) => "stats",
            Commands::Clear(_) => "clear",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(file) = &cli.config {
        if config.config_file.as_ref() != Some(file) {
            config = config.merge_yaml(file)?;
        }
    }

    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.validate()?;

    logging::init_logging(
        config.log_level.as_deref(),
        config.log_format()?,
        config.no_color,
    )?;

    tracing::info!("manualqa starting");
    tracing::debug!("Workspace: {:?}", config.workspace);

    config.ensure_data_dir()?;

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Query(cmd) => cmd.execute(&config).await,
        Commands::List(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Clear(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
