//! Document, chunk and upload types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of `ChunkMetadata::source` for chunks produced by PDF uploads.
pub const PDF_UPLOAD_SOURCE: &str = "pdf_upload";

/// Provenance attached to every chunk of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Original filename as uploaded
    pub filename: String,

    /// Identifier assigned to the upload
    pub file_id: String,

    /// 1-based page the chunk starts on, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Origin tag, e.g. "pdf_upload"
    #[serde(default)]
    pub source: String,

    /// Where the saved upload lives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl ChunkMetadata {
    pub fn for_upload(filename: &str, file_id: &str, file_path: &str) -> Self {
        Self {
            filename: filename.to_string(),
            file_id: file_id.to_string(),
            page: None,
            source: PDF_UPLOAD_SOURCE.to_string(),
            file_path: Some(file_path.to_string()),
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// A piece of document text small enough to embed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// A chunk as stored in the vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedChunk {
    /// Unique id assigned at insertion
    pub id: String,
    pub chunk: Chunk,
    /// Embedding vector (normalized)
    pub embedding: Vec<f32>,
}

/// Summary of the vector collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Number of stored chunks
    #[serde(rename = "total_documents")]
    pub count: usize,

    #[serde(rename = "collection_name")]
    pub name: String,

    #[serde(rename = "persist_directory")]
    pub location: String,
}

/// Equality filter over chunk metadata fields.
///
/// A chunk matches when every key equals the corresponding metadata field.
/// An empty filter matches every chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter(BTreeMap<String, serde_json::Value>);

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn file_id(file_id: &str) -> Self {
        Self::new().with("file_id", file_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        if self.0.is_empty() {
            return true;
        }

        let fields = match serde_json::to_value(metadata) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => return false,
        };

        self.0.iter().all(|(key, expected)| {
            fields.get(key).unwrap_or(&serde_json::Value::Null) == expected
        })
    }
}

/// One ingested document, as recorded in the upload log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub file_id: String,
    pub filename: String,
    pub file_path: String,
    pub num_chunks: usize,
    pub byte_count: u64,
    /// SHA-256 of the uploaded bytes, hex encoded
    pub content_hash: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Outcome of a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReport {
    pub message: String,
    pub file_id: String,
    pub filename: String,
    pub num_chunks: usize,
    pub file_path: String,
}

impl From<&UploadRecord> for UploadReport {
    fn from(record: &UploadRecord) -> Self {
        Self {
            message: "PDF uploaded and processed successfully".to_string(),
            file_id: record.file_id.clone(),
            filename: record.filename.clone(),
            num_chunks: record.num_chunks,
            file_path: record.file_path.clone(),
        }
    }
}
