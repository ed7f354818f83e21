//! Document ingestion: save, extract, chunk, embed, track.

use crate::chunker::Chunker;
use crate::extract::TextExtractor;
use crate::store::VectorStore;
use crate::types::{ChunkMetadata, MetadataFilter, UploadRecord, UploadReport};
use crate::uploads::UploadTracker;
use chrono::Utc;
use pdfchat_core::{AppConfig, AppError, AppResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub struct DocumentIngestor {
    store: Arc<VectorStore>,
    chunker: Chunker,
    extractor: Arc<dyn TextExtractor>,
    tracker: UploadTracker,
    uploads_dir: PathBuf,
    max_file_size: u64,
}

impl DocumentIngestor {
    pub fn new(
        store: Arc<VectorStore>,
        chunker: Chunker,
        extractor: Arc<dyn TextExtractor>,
        tracker: UploadTracker,
        uploads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            chunker,
            extractor,
            tracker,
            uploads_dir: uploads_dir.into(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Ingestor using the chunking, upload and log locations from `config`.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<VectorStore>,
        extractor: Arc<dyn TextExtractor>,
    ) -> AppResult<Self> {
        let chunker = Chunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
        Ok(Self::new(
            store,
            chunker,
            extractor,
            UploadTracker::new(config.upload_log_path()),
            config.uploads_dir(),
        )
        .with_max_file_size(config.upload.max_file_size))
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn tracker(&self) -> &UploadTracker {
        &self.tracker
    }

    /// Ingest the PDF at `path`.
    pub async fn ingest_file(&self, path: &Path) -> AppResult<UploadReport> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::Processing(format!("Not a file: {}", path.display())))?;
        check_extension(&filename)?;

        let size = std::fs::metadata(path)?.len();
        self.check_size(size)?;

        let bytes = tokio::fs::read(path).await?;
        self.ingest_bytes(bytes, &filename).await
    }

    /// Ingest an uploaded document held in memory.
    pub async fn ingest_bytes(&self, bytes: Vec<u8>, filename: &str) -> AppResult<UploadReport> {
        check_extension(filename)?;
        self.check_size(bytes.len() as u64)?;

        let start = Instant::now();
        let file_id = uuid::Uuid::new_v4().to_string();

        std::fs::create_dir_all(&self.uploads_dir)?;
        let saved_path = self.uploads_dir.join(format!("{}.pdf", file_id));
        std::fs::write(&saved_path, &bytes)?;

        let content_hash = format!("{:x}", Sha256::digest(&bytes));
        let byte_count = bytes.len() as u64;

        let result = self
            .process(bytes, filename, &file_id, &saved_path)
            .await
            .and_then(|num_chunks| {
                let record = UploadRecord {
                    file_id: file_id.clone(),
                    filename: filename.to_string(),
                    file_path: saved_path.display().to_string(),
                    num_chunks,
                    byte_count,
                    content_hash,
                    uploaded_at: Utc::now(),
                };
                self.tracker.track(&record)?;
                Ok(record)
            });

        match result {
            Ok(record) => {
                tracing::info!(
                    "Ingested {} as {}: {} chunks in {:.2}s",
                    filename,
                    file_id,
                    record.num_chunks,
                    start.elapsed().as_secs_f64()
                );
                Ok(UploadReport::from(&record))
            }
            Err(e) => {
                tracing::warn!("Ingesting {} failed: {}", filename, e);
                if let Err(cleanup) = self
                    .store
                    .delete_by_metadata(&MetadataFilter::file_id(&file_id))
                    .await
                {
                    tracing::warn!("Could not remove chunks of {}: {}", file_id, cleanup);
                }
                if let Err(cleanup) = std::fs::remove_file(&saved_path) {
                    tracing::warn!("Could not remove {}: {}", saved_path.display(), cleanup);
                }
                Err(e)
            }
        }
    }

    /// Extract, chunk and index; returns the number of chunks stored.
    async fn process(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        file_id: &str,
        saved_path: &Path,
    ) -> AppResult<usize> {
        let extractor = Arc::clone(&self.extractor);
        let text = tokio::task::spawn_blocking(move || extractor.extract_text(&bytes))
            .await
            .map_err(|e| AppError::Processing(format!("Extraction task failed: {}", e)))??;

        let metadata =
            ChunkMetadata::for_upload(filename, file_id, &saved_path.display().to_string());
        let chunks = self.chunker.split(&text, &metadata)?;
        if chunks.is_empty() {
            return Err(AppError::Processing(format!(
                "No extractable text in {}",
                filename
            )));
        }

        let ids = self.store.insert(chunks).await?;
        Ok(ids.len())
    }

    /// Remove a document's chunks, upload record and saved file. Returns
    /// the number of chunks removed.
    pub async fn delete_document(&self, file_id: &str) -> AppResult<usize> {
        let removed = self
            .store
            .delete_by_metadata(&MetadataFilter::file_id(file_id))
            .await?;

        let record = self.tracker.remove(file_id)?;
        if record.is_none() && removed == 0 {
            return Err(AppError::Processing(format!("Unknown document: {}", file_id)));
        }

        if let Some(record) = record {
            remove_if_present(Path::new(&record.file_path))?;
        }

        tracing::info!("Deleted document {} ({} chunks)", file_id, removed);
        Ok(removed)
    }

    /// Remove every document. Returns the number of chunks removed.
    pub async fn clear(&self) -> AppResult<usize> {
        let records = self.tracker.list()?;
        let removed = self.store.clear().await?;
        self.tracker.clear()?;

        for record in &records {
            remove_if_present(Path::new(&record.file_path))?;
        }

        tracing::info!("Cleared {} chunks from {} documents", removed, records.len());
        Ok(removed)
    }

    fn check_size(&self, size: u64) -> AppResult<()> {
        if size > self.max_file_size {
            return Err(AppError::Processing(format!(
                "File size too large: {} bytes (limit {})",
                size, self.max_file_size
            )));
        }
        Ok(())
    }
}

fn check_extension(filename: &str) -> AppResult<()> {
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(AppError::Processing(format!(
            "Only PDF files are allowed: {}",
            filename
        )));
    }
    Ok(())
}

fn remove_if_present(path: &Path) -> AppResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct FailingExtractor;

    impl TextExtractor for FailingExtractor {
        fn extract_text(&self, _bytes: &[u8]) -> AppResult<String> {
            Err(AppError::Processing("corrupt document".to_string()))
        }
    }

    async fn ingestor(temp: &TempDir, extractor: Arc<dyn TextExtractor>) -> DocumentIngestor {
        let store = VectorStore::open_lancedb(
            Arc::new(TrigramProvider::new(64)),
            &temp.path().join("index"),
            "documents",
        )
        .await
        .unwrap();

        DocumentIngestor::new(
            Arc::new(store),
            Chunker::new(200, 40).unwrap(),
            extractor,
            UploadTracker::new(temp.path().join("uploads.jsonl")),
            temp.path().join("uploads"),
        )
    }

    fn plain() -> Arc<dyn TextExtractor> {
        Arc::new(crate::extract::PdftotextExtractor::default())
    }

    #[test]
    fn test_check_extension() {
        assert!(check_extension("CV.PDF").is_ok());
        let err = check_extension("notes.txt").unwrap_err();
        assert!(err.to_string().contains("Only PDF files are allowed"));
    }

    #[tokio::test]
    async fn test_size_limit() {
        let temp = TempDir::new().unwrap();
        let ingestor = ingestor(&temp, plain()).await.with_max_file_size(8);

        let err = ingestor
            .ingest_bytes(b"far more than eight bytes".to_vec(), "big.pdf")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("File size too large"));
    }

    #[tokio::test]
    async fn test_ingest_tracks_upload() {
        let temp = TempDir::new().unwrap();
        let ingestor = ingestor(&temp, plain()).await;

        let report = ingestor
            .ingest_bytes(
                b"Senior engineer with a decade of distributed systems work.".to_vec(),
                "cv.pdf",
            )
            .await
            .unwrap();

        assert_eq!(report.filename, "cv.pdf");
        assert_eq!(report.num_chunks, 1);
        assert!(Path::new(&report.file_path).exists());

        let records = ingestor.tracker().list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_id, report.file_id);
        assert_eq!(records[0].content_hash.len(), 64);
    }

    #[tokio::test]
    async fn test_failed_extraction_removes_saved_file() {
        let temp = TempDir::new().unwrap();
        let ingestor = ingestor(&temp, Arc::new(FailingExtractor)).await;

        let err = ingestor
            .ingest_bytes(b"%PDF-1.4 whatever".to_vec(), "broken.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Processing(_)));

        let leftovers = std::fs::read_dir(temp.path().join("uploads")).unwrap().count();
        assert_eq!(leftovers, 0);
        assert!(ingestor.tracker().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_document_is_rejected() {
        let temp = TempDir::new().unwrap();
        let ingestor = ingestor(&temp, plain()).await;

        let err = ingestor.ingest_bytes(b"   \n ".to_vec(), "blank.pdf").await.unwrap_err();
        assert!(err.to_string().contains("No extractable text"));
    }

    #[tokio::test]
    async fn test_delete_document() {
        let temp = TempDir::new().unwrap();
        let ingestor = ingestor(&temp, plain()).await;

        let keep = ingestor
            .ingest_bytes(b"Gardening notes about tomatoes and basil.".to_vec(), "garden.pdf")
            .await
            .unwrap();
        let gone = ingestor
            .ingest_bytes(b"Quarterly report on revenue and margins.".to_vec(), "report.pdf")
            .await
            .unwrap();

        assert_eq!(ingestor.delete_document(&gone.file_id).await.unwrap(), 1);
        assert!(!Path::new(&gone.file_path).exists());
        assert!(Path::new(&keep.file_path).exists());
        assert_eq!(ingestor.tracker().list().unwrap().len(), 1);

        assert!(ingestor.delete_document(&gone.file_id).await.is_err());
    }

    #[tokio::test]
    async fn test_clear() {
        let temp = TempDir::new().unwrap();
        let ingestor = ingestor(&temp, plain()).await;
        let report = ingestor
            .ingest_bytes(b"Some document body long enough to index.".to_vec(), "a.pdf")
            .await
            .unwrap();

        assert_eq!(ingestor.clear().await.unwrap(), 1);
        assert!(!Path::new(&report.file_path).exists());
        assert!(ingestor.tracker().list().unwrap().is_empty());
    }
}
