//! Question answering over the indexed documents.

use super::citations::build_citations;
use super::generator::AnswerGenerator;
use super::retriever::Retriever;
use super::synthesizer::AnswerSynthesizer;
use super::types::{AnswerMethod, AnswerResult, DocumentSummary};
use crate::types::Chunk;
use pdfchat_core::{AppError, AppResult};
use std::collections::BTreeSet;
use std::sync::Arc;

pub const NOTHING_FOUND: &str =
    "I couldn't find any relevant information in the document for your question.";
pub const SEARCH_FAILED: &str =
    "I'm sorry, I encountered an error while searching the document. Please try again.";

const DEFAULT_TOP_K: usize = 3;
const DEFAULT_CITATION_LIMIT: usize = 3;
const SUMMARY_SAMPLE: usize = 5;
/// Generated answers cite only the best chunk.
const GENERATED_CITATIONS: usize = 1;

/// Retrieve, synthesize, cite.
pub struct QaService {
    retriever: Arc<dyn Retriever>,
    synthesizer: AnswerSynthesizer,
    generator: Option<AnswerGenerator>,
    top_k: usize,
    citation_limit: usize,
}

impl QaService {
    pub fn new(retriever: Arc<dyn Retriever>, synthesizer: AnswerSynthesizer) -> Self {
        Self {
            retriever,
            synthesizer,
            generator: None,
            top_k: DEFAULT_TOP_K,
            citation_limit: DEFAULT_CITATION_LIMIT,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_citation_limit(mut self, limit: usize) -> Self {
        self.citation_limit = limit;
        self
    }

    /// Enable [`QaService::ask_generated`].
    pub fn with_generator(mut self, generator: AnswerGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Answer `question`. Failures become an apologetic answer with no
    /// citations.
    pub async fn ask(&self, question: &str) -> AnswerResult {
        match self.try_ask(question).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Answering {:?} failed: {}", question, e);
                AnswerResult::without_citations(SEARCH_FAILED, question, AnswerMethod::VectorSearch)
            }
        }
    }

    pub async fn try_ask(&self, question: &str) -> AppResult<AnswerResult> {
        let chunks = self.retrieve(question).await?;
        if chunks.is_empty() {
            return Ok(AnswerResult::without_citations(
                NOTHING_FOUND,
                question,
                AnswerMethod::VectorSearch,
            ));
        }

        Ok(AnswerResult {
            answer: self.synthesizer.synthesize(question, &chunks),
            citations: build_citations(&chunks, self.citation_limit),
            question: question.to_string(),
            method: AnswerMethod::VectorSearch,
        })
    }

    /// Answer `question` with the language model. Failures become an
    /// apologetic answer naming the error.
    pub async fn ask_generated(&self, question: &str) -> AnswerResult {
        match self.try_ask_generated(question).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Generating an answer to {:?} failed: {}", question, e);
                AnswerResult::without_citations(
                    format!(
                        "I apologize, but I encountered an error while processing your question: {}",
                        e
                    ),
                    question,
                    AnswerMethod::Llm,
                )
            }
        }
    }

    pub async fn try_ask_generated(&self, question: &str) -> AppResult<AnswerResult> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| AppError::Llm("No language model configured".to_string()))?;

        let chunks = self.retrieve(question).await?;
        if chunks.is_empty() {
            return Ok(AnswerResult::without_citations(
                NOTHING_FOUND,
                question,
                AnswerMethod::Llm,
            ));
        }

        tracing::info!("Generating answer with {}", generator.model());
        Ok(AnswerResult {
            answer: generator.generate(question, &chunks).await?,
            citations: build_citations(&chunks, GENERATED_CITATIONS),
            question: question.to_string(),
            method: AnswerMethod::Llm,
        })
    }

    /// Search using `keyword` as the query.
    pub async fn search_by_keyword(&self, keyword: &str) -> AnswerResult {
        let chunks = match self.retrieve(keyword).await {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::error!("Keyword search for {:?} failed: {}", keyword, e);
                return AnswerResult::without_citations(
                    format!(
                        "I'm sorry, I encountered an error while searching for the keyword '{}'. Please try again.",
                        keyword
                    ),
                    keyword,
                    AnswerMethod::KeywordSearch,
                );
            }
        };

        if chunks.is_empty() {
            return AnswerResult::without_citations(
                format!("No content found containing the keyword '{}'.", keyword),
                keyword,
                AnswerMethod::KeywordSearch,
            );
        }

        let answer = format!(
            "Found {} relevant sections containing '{}':\n\n{}",
            chunks.len(),
            keyword,
            self.synthesizer.synthesize(keyword, &chunks)
        );

        AnswerResult {
            answer,
            citations: build_citations(&chunks, self.citation_limit),
            question: keyword.to_string(),
            method: AnswerMethod::KeywordSearch,
        }
    }

    pub async fn document_summary(&self) -> AppResult<DocumentSummary> {
        let total_documents = self.retriever.count().await?;
        let sample = self.retriever.sample(SUMMARY_SAMPLE).await?;

        let document_types: BTreeSet<&str> = sample
            .iter()
            .map(|chunk| document_type(&chunk.metadata.filename))
            .collect();

        Ok(DocumentSummary {
            total_documents,
            sampled_chunks: sample.len(),
            document_types: document_types.into_iter().map(String::from).collect(),
            method: AnswerMethod::VectorSearch,
        })
    }

    async fn retrieve(&self, query: &str) -> AppResult<Vec<Chunk>> {
        let hits = self.retriever.retrieve(query, self.top_k).await?;
        if let Some((_, best)) = hits.first() {
            tracing::debug!("Retrieved {} chunks (top score {:.3})", hits.len(), best);
        }
        Ok(hits.into_iter().map(|(chunk, _)| chunk).collect())
    }
}

fn document_type(filename: &str) -> &'static str {
    let lower = filename.to_lowercase();
    if lower.ends_with(".pdf") {
        "PDF"
    } else if lower.ends_with(".txt") {
        "Text"
    } else if lower.ends_with(".doc") {
        "Word"
    } else {
        "Document"
    }
}
