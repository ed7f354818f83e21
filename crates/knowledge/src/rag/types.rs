//! Answer and citation types.

use serde::{Deserialize, Serialize};

/// Pointer from an answer back to the chunk that supports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based page number (1 when unknown)
    pub page: u32,

    /// Display label, e.g. "Page 3"
    #[serde(rename = "text")]
    pub label: String,

    pub filename: String,

    /// Leading part of the chunk text, "..." appended when cut
    #[serde(rename = "content")]
    pub excerpt: String,

    /// 1-based position in relevance order
    #[serde(rename = "relevance_rank")]
    pub rank: usize,
}

/// How an answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMethod {
    VectorSearch,
    KeywordSearch,
    /// Written by a language model from retrieved context
    Llm,
}

/// A user-facing answer. Always well-formed, even when retrieval failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub citations: Vec<Citation>,
    /// The question (or keyword) that was asked
    pub question: String,
    pub method: AnswerMethod,
}

impl AnswerResult {
    pub fn without_citations(answer: impl Into<String>, question: &str, method: AnswerMethod) -> Self {
        Self {
            answer: answer.into(),
            citations: Vec::new(),
            question: question.to_string(),
            method,
        }
    }
}

/// Overview of what the collection holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub total_documents: usize,
    /// Chunks inspected to derive `document_types`
    #[serde(rename = "total_chunks")]
    pub sampled_chunks: usize,
    pub document_types: Vec<String>,
    pub method: AnswerMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_wire_names() {
        let citation = Citation {
            page: 2,
            label: "Page 2".to_string(),
            filename: "resume.pdf".to_string(),
            excerpt: "Skills...".to_string(),
            rank: 1,
        };

        let json = serde_json::to_value(&citation).unwrap();
        assert_eq!(json["text"], "Page 2");
        assert_eq!(json["content"], "Skills...");
        assert_eq!(json["relevance_rank"], 1);
    }

    #[test]
    fn test_method_serializes_snake_case() {
        let result = AnswerResult::without_citations("none", "q", AnswerMethod::KeywordSearch);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["method"], "keyword_search");
        assert!(json["citations"].as_array().unwrap().is_empty());
    }
}
