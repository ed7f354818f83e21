//! pdfchat CLI
//!
//! Upload PDFs into a local vector index and ask questions about them.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    AskCommand, ClearCommand, DeleteCommand, DocumentsCommand, KeywordCommand, StatsCommand,
    SummaryCommand, UploadCommand,
};
use pdfchat_core::{config::AppConfig, logging, AppResult};
use pdfchat_knowledge::KnowledgeBase;
use std::path::PathBuf;

/// Ask questions about your PDFs, answered from the documents themselves
#[derive(Parser, Debug)]
#[command(name = "pdfchat")]
#[command(about = "Question answering over uploaded PDF documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "PDFCHAT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: <workspace>/.pdfchat/config.yaml)
    #[arg(short, long, global = true, env = "PDFCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload PDF files (or directories of PDFs) into the index
    Upload(UploadCommand),

    /// Ask a question about the uploaded documents
    Ask(AskCommand),

    /// Search the documents for a keyword
    Keyword(KeywordCommand),

    /// Show index statistics
    Stats(StatsCommand),

    /// Summarize what the index holds
    Summary(SummaryCommand),

    /// List uploaded documents
    Documents(DocumentsCommand),

    /// Remove every document from the index
    Clear(ClearCommand),

    /// Remove one document by its file id
    Delete(DeleteCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Upload(_) => "upload",
            Commands::Ask(_) => "ask",
            Commands::Keyword(_) => "keyword",
            Commands::Stats(_) => "stats",
            Commands::Summary(_) => "summary",
            Commands::Documents(_) => "documents",
            Commands::Clear(_) => "clear",
            Commands::Delete(_) => "delete",
        }
    }

    fn top_k(&self) -> Option<usize> {
        match self {
            Commands::Ask(cmd) => cmd.top_k,
            Commands::Keyword(cmd) => cmd.top_k,
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // File and environment first, then flags
    let mut config = AppConfig::load_with(cli.workspace.clone(), cli.config.clone())?
        .with_overrides(cli.log_level.clone(), cli.verbose, cli.no_color);
    if let Some(top_k) = cli.command.top_k() {
        config.retrieval.top_k = top_k;
    }
    config.validate()?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("pdfchat starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Index: {:?}", config.index_dir());

    config.ensure_state_dir()?;

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let kb = KnowledgeBase::open(&config).await?;

    let result = match cli.command {
        Commands::Upload(cmd) => cmd.execute(&kb).await,
        Commands::Ask(cmd) => cmd.execute(&kb).await,
        Commands::Keyword(cmd) => cmd.execute(&kb).await,
        Commands::Stats(cmd) => cmd.execute(&kb).await,
        Commands::Summary(cmd) => cmd.execute(&kb).await,
        Commands::Documents(cmd) => cmd.execute(&kb).await,
        Commands::Clear(cmd) => cmd.execute(&kb).await,
        Commands::Delete(cmd) => cmd.execute(&kb).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
