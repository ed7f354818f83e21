//! Text extraction from uploaded documents.
//!
//! Extractors produce page-tagged text: each page is preceded by a
//! `[[PAGE:NNNN]]` marker line which the chunker turns into per-chunk page
//! numbers.

use pdfchat_core::{AppError, AppResult};
use std::process::Command;

const FORM_FEED: char = '\u{000C}';

/// Marker line placed before the text of page `page` (1-based).
pub fn page_marker(page: usize) -> String {
    format!("[[PAGE:{:04}]]", page)
}

/// Turns raw document bytes into page-tagged text.
pub trait TextExtractor: Send + Sync + std::fmt::Debug {
    fn extract_text(&self, bytes: &[u8]) -> AppResult<String>;
}

/// Extractor backed by poppler's `pdftotext` command.
///
/// Input that is not a PDF (no `%PDF` header) is treated as UTF-8 text
/// belonging to page 1.
#[derive(Debug, Clone)]
pub struct PdftotextExtractor {
    program: String,
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self {
            program: "pdftotext".to_string(),
        }
    }
}

impl PdftotextExtractor {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run_pdftotext(&self, pdf_bytes: &[u8]) -> AppResult<String> {
        let dir = tempfile::tempdir().map_err(|e| {
            AppError::Processing(format!(
                "Failed creating temporary directory for PDF extraction: {}",
                e
            ))
        })?;
        let input_path = dir.path().join("input.pdf");
        std::fs::write(&input_path, pdf_bytes).map_err(|e| {
            AppError::Processing(format!("Failed writing temporary PDF file: {}", e))
        })?;

        let output = Command::new(&self.program)
            .arg("-layout")
            .arg("-enc")
            .arg("UTF-8")
            .arg(&input_path)
            .arg("-")
            .output()
            .map_err(|e| {
                AppError::Processing(format!("Error processing PDF: {} is unavailable: {}", self.program, e))
            })?;

        if !output.status.success() {
            return Err(AppError::Processing(format!(
                "Error processing PDF: {} exited with {:?}: {}",
                self.program,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8(output.stdout).map_err(|e| {
            AppError::Processing(format!("PDF extraction output was not UTF-8: {}", e))
        })?;

        Ok(tag_pages(&text))
    }
}

impl TextExtractor for PdftotextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> AppResult<String> {
        if bytes.starts_with(b"%PDF") {
            let text = self.run_pdftotext(bytes)?;
            tracing::debug!("Extracted {} bytes of text from PDF", text.len());
            return Ok(text);
        }

        let decoded = std::str::from_utf8(bytes).map_err(|e| {
            AppError::Processing(format!("Document is neither a PDF nor UTF-8 text: {}", e))
        })?;
        Ok(format!("{}\n{}", page_marker(1), decoded))
    }
}

/// Insert page markers at the form feeds `pdftotext` emits between pages.
///
/// Blank pages are dropped but keep their number.
fn tag_pages(text: &str) -> String {
    let mut output = String::new();
    for (idx, page) in text.split(FORM_FEED).enumerate() {
        let trimmed = page.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&page_marker(idx + 1));
        output.push('\n');
        output.push_str(trimmed);
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_marker_format() {
        assert_eq!(page_marker(1), "[[PAGE:0001]]");
        assert_eq!(page_marker(42), "[[PAGE:0042]]");
    }

    #[test]
    fn test_tag_pages_skips_blank_pages() {
        let raw = "First page\u{000C}   \u{000C}Third page\u{000C}";
        let tagged = tag_pages(raw);
        assert_eq!(
            tagged,
            "[[PAGE:0001]]\nFirst page\n\n[[PAGE:0003]]\nThird page\n"
        );
    }

    #[test]
    fn test_tag_pages_empty_document() {
        assert_eq!(tag_pages("\u{000C}\u{000C}"), "");
    }

    #[test]
    fn test_plain_text_is_page_one() {
        let extractor = PdftotextExtractor::default();
        let text = extractor.extract_text(b"Skills: Rust").unwrap();
        assert_eq!(text, "[[PAGE:0001]]\nSkills: Rust");
    }

    #[test]
    fn test_binary_non_pdf_is_rejected() {
        let extractor = PdftotextExtractor::default();
        let err = extractor.extract_text(&[0xff, 0xfe, 0x00, 0x9f]).unwrap_err();
        assert!(matches!(err, AppError::Processing(_)));
    }

    #[test]
    fn test_missing_program_is_processing_error() {
        let extractor = PdftotextExtractor::with_program("pdftotext-does-not-exist");
        let err = extractor.extract_text(b"%PDF-1.4\n%%EOF").unwrap_err();
        assert!(matches!(err, AppError::Processing(_)));
    }
}
