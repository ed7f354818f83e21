//! Index inspection and maintenance commands.

use clap::Args;
use pdfchat_core::AppResult;
use pdfchat_knowledge::KnowledgeBase;

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, kb: &KnowledgeBase) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let stats = kb.store.stats().await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Collection: {}", stats.name);
            println!("Chunks:     {}", stats.count);
            println!("Location:   {}", stats.location);
        }
        Ok(())
    }
}

/// Summarize what the index holds
#[derive(Args, Debug)]
pub struct SummaryCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SummaryCommand {
    pub async fn execute(&self, kb: &KnowledgeBase) -> AppResult<()> {
        tracing::info!("Executing summary command");

        let summary = kb.qa.document_summary().await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("Chunks indexed: {}", summary.total_documents);
            println!("Chunks sampled: {}", summary.sampled_chunks);
            if summary.document_types.is_empty() {
                println!("Document types: (none)");
            } else {
                println!("Document types: {}", summary.document_types.join(", "));
            }
        }
        Ok(())
    }
}

/// List uploaded documents
#[derive(Args, Debug)]
pub struct DocumentsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DocumentsCommand {
    pub async fn execute(&self, kb: &KnowledgeBase) -> AppResult<()> {
        tracing::info!("Executing documents command");

        let records = kb.ingestor.tracker().list()?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }

        if records.is_empty() {
            println!("No documents uploaded");
            return Ok(());
        }

        for record in &records {
            println!(
                "{}  {}  {} chunks  {}",
                record.file_id,
                record.uploaded_at.format("%Y-%m-%d %H:%M"),
                record.num_chunks,
                record.filename
            );
        }
        Ok(())
    }
}

/// Remove every document from the index
#[derive(Args, Debug)]
pub struct ClearCommand {}

impl ClearCommand {
    pub async fn execute(&self, kb: &KnowledgeBase) -> AppResult<()> {
        tracing::info!("Executing clear command");

        let removed = kb.ingestor.clear().await?;
        println!("Removed {} chunks", removed);
        Ok(())
    }
}

/// Remove one document by its file id
#[derive(Args, Debug)]
pub struct DeleteCommand {
    /// File id printed by `upload`
    pub file_id: String,
}

impl DeleteCommand {
    pub async fn execute(&self, kb: &KnowledgeBase) -> AppResult<()> {
        tracing::info!("Executing delete command for {}", self.file_id);

        let removed = kb.ingestor.delete_document(&self.file_id).await?;
        println!("Deleted {} ({} chunks)", self.file_id, removed);
        Ok(())
    }
}
