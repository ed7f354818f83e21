//! Upload command handler.

use clap::Args;
use pdfchat_core::{AppError, AppResult};
use pdfchat_knowledge::{KnowledgeBase, UploadReport};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Upload PDF files into the index
#[derive(Args, Debug)]
pub struct UploadCommand {
    /// PDF files, or directories searched recursively for PDFs
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl UploadCommand {
    pub async fn execute(&self, kb: &KnowledgeBase) -> AppResult<()> {
        tracing::info!("Executing upload command");

        let files = collect_pdfs(&self.paths);
        if files.is_empty() {
            return Err(AppError::Processing("No PDF files found".to_string()));
        }

        let mut reports: Vec<UploadReport> = Vec::new();
        let mut failures: Vec<(PathBuf, String)> = Vec::new();

        for file in &files {
            match kb.ingestor.ingest_file(file).await {
                Ok(report) => {
                    if !self.json {
                        println!(
                            "{} -> {} ({} chunks)",
                            file.display(),
                            report.file_id,
                            report.num_chunks
                        );
                    }
                    reports.push(report);
                }
                Err(e) => {
                    if !self.json {
                        eprintln!("{}: {}", file.display(), e);
                    }
                    failures.push((file.clone(), e.to_string()));
                }
            }
        }

        if self.json {
            let output = serde_json::json!({
                "uploaded": reports,
                "failed": failures
                    .iter()
                    .map(|(path, error)| serde_json::json!({
                        "path": path.display().to_string(),
                        "error": error,
                    }))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Uploaded {} of {} files", reports.len(), files.len());
        }

        if reports.is_empty() {
            return Err(AppError::Processing(format!(
                "All {} uploads failed",
                failures.len()
            )));
        }
        Ok(())
    }
}

/// Expand directories into the PDF files beneath them, keeping explicit
/// file arguments as given.
fn collect_pdfs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(
                WalkDir::new(path)
                    .follow_links(false)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file() && is_pdf(e.path()))
                    .map(|e| e.into_path()),
            );
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
