//! Citation building.

use super::types::Citation;
use crate::types::Chunk;

/// Excerpt length in characters before "..." is appended.
pub const EXCERPT_CHARS: usize = 200;

const UNKNOWN_FILENAME: &str = "Document";

/// Citations for the first `limit` chunks, kept in the given order.
pub fn build_citations(chunks: &[Chunk], limit: usize) -> Vec<Citation> {
    chunks
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, chunk)| {
            let page = chunk.metadata.page.unwrap_or(1);
            let filename = if chunk.metadata.filename.is_empty() {
                UNKNOWN_FILENAME.to_string()
            } else {
                chunk.metadata.filename.clone()
            };

            Citation {
                page,
                label: format!("Page {}", page),
                filename,
                excerpt: excerpt(&chunk.text),
                rank: i + 1,
            }
        })
        .collect()
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkMetadata;

    fn chunk(text: &str, page: Option<u32>) -> Chunk {
        let mut metadata = ChunkMetadata::for_upload("resume.pdf", "f1", "/tmp/f1.pdf");
        metadata.page = page;
        Chunk::new(text, metadata)
    }

    #[test]
    fn test_empty_input() {
        assert!(build_citations(&[], 3).is_empty());
    }

    #[test]
    fn test_limit_and_rank() {
        let chunks: Vec<Chunk> = (0..5).map(|i| chunk(&format!("text {}", i), Some(i))).collect();
        let citations = build_citations(&chunks, 3);

        assert_eq!(citations.len(), 3);
        assert_eq!(
            citations.iter().map(|c| c.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(citations[2].excerpt, "text 2");
        assert_eq!(citations[2].label, "Page 2");
    }

    #[test]
    fn test_defaults_for_missing_metadata() {
        let mut c = chunk("body", None);
        c.metadata.filename.clear();

        let citation = &build_citations(&[c], 3)[0];
        assert_eq!(citation.page, 1);
        assert_eq!(citation.label, "Page 1");
        assert_eq!(citation.filename, "Document");
    }

    #[test]
    fn test_excerpt_truncation() {
        let exact = "a".repeat(EXCERPT_CHARS);
        assert_eq!(excerpt(&exact), exact);

        let long = "é".repeat(EXCERPT_CHARS + 50);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), EXCERPT_CHARS + 3);
    }
}
