//! Text chunking with configurable size and overlap.
//!
//! Splitting is delegated to `text-splitter`, which prefers paragraph,
//! then sentence, then word boundaries before falling back to a hard
//! character cut. Sizes are counted in characters.
//!
//! Input may carry `[[PAGE:NNNN]]` marker lines (see [`crate::extract`]).
//! Markers are removed before splitting and each chunk is tagged with the
//! page it starts on.

use crate::types::{Chunk, ChunkMetadata};
use pdfchat_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

const PAGE_MARKER_PREFIX: &str = "[[PAGE:";
const PAGE_MARKER_SUFFIX: &str = "]]";

/// Splits document text into overlapping chunks.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Create a chunker. Overlap must be smaller than the chunk size.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Processing(
                "Chunk size must be greater than 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::Processing(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Split `text` into chunks, each carrying a copy of `metadata`.
    ///
    /// Blank input yields no chunks; deciding whether that is an error is
    /// left to the caller.
    pub fn split(&self, text: &str, metadata: &ChunkMetadata) -> AppResult<Vec<Chunk>> {
        let paged = PagedText::parse(text);
        if paged.text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let chunks: Vec<Chunk> = self
            .spans(&paged.text)?
            .into_iter()
            .map(|(offset, piece)| {
                let metadata = match paged.page_at(offset) {
                    Some(page) => metadata.clone().with_page(page),
                    None => metadata.clone(),
                };
                Chunk::new(piece, metadata)
            })
            .collect();

        tracing::debug!(
            "Chunked {} chars into {} chunks (size: {}, overlap: {})",
            paged.text.chars().count(),
            chunks.len(),
            self.chunk_size,
            self.chunk_overlap
        );

        Ok(chunks)
    }

    /// Chunk text with the byte offset each chunk starts at.
    fn spans<'t>(&self, text: &'t str) -> AppResult<Vec<(usize, &'t str)>> {
        let config = ChunkConfig::new(self.chunk_size)
            .with_overlap(self.chunk_overlap)
            .map_err(|e| AppError::Processing(format!("Invalid chunk configuration: {}", e)))?;
        let splitter = TextSplitter::new(config);

        Ok(splitter
            .chunk_indices(text)
            .filter(|(_, piece)| !piece.trim().is_empty())
            .collect())
    }
}

/// Text with page markers removed, plus where each page begins.
struct PagedText {
    text: String,
    /// (byte offset into `text`, page number), ascending by offset
    page_starts: Vec<(usize, u32)>,
}

impl PagedText {
    fn parse(raw: &str) -> Self {
        if !raw.contains(PAGE_MARKER_PREFIX) {
            return Self {
                text: raw.to_string(),
                page_starts: Vec::new(),
            };
        }

        let mut text = String::with_capacity(raw.len());
        let mut page_starts = Vec::new();

        for line in raw.split_inclusive('\n') {
            match parse_page_marker(line) {
                Some(page) => page_starts.push((text.len(), page)),
                None => text.push_str(line),
            }
        }

        Self { text, page_starts }
    }

    fn page_at(&self, offset: usize) -> Option<u32> {
        let idx = self
            .page_starts
            .partition_point(|(start, _)| *start <= offset);
        if idx == 0 {
            // Text before the first marker belongs to the first page
            return self.page_starts.first().map(|(_, page)| *page);
        }
        Some(self.page_starts[idx - 1].1)
    }
}

fn parse_page_marker(line: &str) -> Option<u32> {
    line.trim()
        .strip_prefix(PAGE_MARKER_PREFIX)?
        .strip_suffix(PAGE_MARKER_SUFFIX)?
        .parse()
        .ok()
}
