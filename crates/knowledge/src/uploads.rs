//! Upload log.
//!
//! One JSON line per ingested document, so uploads can be listed and
//! removed without scanning the vector index.

use crate::types::UploadRecord;
use pdfchat_core::{AppError, AppResult};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

pub struct UploadTracker {
    path: PathBuf,
}

impl UploadTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record` to the log.
    pub fn track(&self, record: &UploadRecord) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::Storage(format!("Failed to open upload log: {}", e)))?;

        writeln!(file, "{}", serde_json::to_string(record)?)
            .map_err(|e| AppError::Storage(format!("Failed to write upload log: {}", e)))?;
        file.sync_all()
            .map_err(|e| AppError::Storage(format!("Failed to sync upload log: {}", e)))?;

        tracing::debug!("Tracked upload {} ({})", record.file_id, record.filename);
        Ok(())
    }

    /// Every tracked upload, oldest first.
    pub fn list(&self) -> AppResult<Vec<UploadRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .map_err(|e| AppError::Storage(format!("Failed to open upload log: {}", e)))?;

        let mut records = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let record = serde_json::from_str(&line).map_err(|e| {
                AppError::Serialization(format!(
                    "Bad upload log entry on line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            records.push(record);
        }

        Ok(records)
    }

    /// Drop the record for `file_id`; returns it if it was tracked.
    pub fn remove(&self, file_id: &str) -> AppResult<Option<UploadRecord>> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .list()?
            .into_iter()
            .partition(|r| r.file_id == file_id);

        if removed.is_empty() {
            return Ok(None);
        }

        let mut body = String::new();
        for record in &kept {
            body.push_str(&serde_json::to_string(record)?);
            body.push('\n');
        }

        let tmp = self.path.with_extension("jsonl.tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(body.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| AppError::Storage(format!("Failed to replace upload log: {}", e)))?;

        Ok(removed.into_iter().next())
    }

    /// Forget every upload; returns how many were tracked.
    pub fn clear(&self) -> AppResult<usize> {
        let count = self.list()?.len();
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .map_err(|e| AppError::Storage(format!("Failed to delete upload log: {}", e)))?;
        }
        Ok(count)
    }
}
