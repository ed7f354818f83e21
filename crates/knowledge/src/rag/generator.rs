//! Generated answers: retrieved context handed to a language model.
//!
//! Model output is cleaned before it is returned. It is split into
//! sentences, repeats are dropped (two sentences are the same when their
//! first ten words match, ignoring case) and the sentence count is capped.
//! A reply still shorter than [`MIN_ANSWER_CHARS`] gets one retry with a
//! differently worded prompt.

use crate::types::Chunk;
use pdfchat_core::config::LlmConfig;
use pdfchat_core::AppResult;
use pdfchat_llm::{LlmClient, LlmRequest};
use std::collections::HashSet;
use std::sync::Arc;

/// Words compared when deciding two sentences repeat each other.
const SENTENCE_KEY_WORDS: usize = 10;
/// Sentences of this many characters or fewer are dropped.
const MIN_SENTENCE_CHARS: usize = 10;
const MAX_SENTENCES: usize = 5;
const MAX_RETRY_SENTENCES: usize = 3;
/// Cut applied when no sentence survives cleaning.
const MAX_RAW_CHARS: usize = 500;
pub const MIN_ANSWER_CHARS: usize = 50;

/// Writes answers with a language model.
pub struct AnswerGenerator {
    client: Arc<dyn LlmClient>,
    config: LlmConfig,
}

impl AnswerGenerator {
    pub fn new(client: Arc<dyn LlmClient>, config: LlmConfig) -> Self {
        Self { client, config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Answer `question` from `chunks`, given best first.
    pub async fn generate(&self, question: &str, chunks: &[Chunk]) -> AppResult<String> {
        let context = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let raw = self.complete(&answer_prompt(question, &context)).await?;
        let answer = clean(&raw, MAX_SENTENCES).unwrap_or_else(|| truncate(&raw, MAX_RAW_CHARS));
        if answer.chars().count() >= MIN_ANSWER_CHARS {
            return Ok(answer);
        }

        tracing::debug!(
            "Answer from {} too short ({} chars), retrying",
            self.config.model,
            answer.chars().count()
        );
        let raw = self.complete(&retry_prompt(question, &context)).await?;
        Ok(clean(&raw, MAX_RETRY_SENTENCES).unwrap_or(raw))
    }

    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let request = LlmRequest::from_config(prompt, &self.config);
        let response = self.client.complete(&request).await?;
        Ok(response.content.trim().to_string())
    }
}

fn answer_prompt(question: &str, context: &str) -> String {
    format!(
        "Question: {}\n\nContext: {}\n\nProvide a concise answer in 2-3 sentences based on the context above. Do not repeat information:",
        question, context
    )
}

fn retry_prompt(question: &str, context: &str) -> String {
    format!(
        "Based on this information: {}\n\nAnswer this question: {}\n\nProvide a concise answer in 2-3 sentences:",
        context, question
    )
}

/// Unique sentences of `raw`, at most `max_sentences`, joined back with
/// periods. `None` when nothing survives.
fn clean(raw: &str, max_sentences: usize) -> Option<String> {
    let mut seen = HashSet::new();
    let sentences: Vec<&str> = raw
        .split('.')
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .filter(|s| {
            let key = s
                .split_whitespace()
                .take(SENTENCE_KEY_WORDS)
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            seen.insert(key)
        })
        .take(max_sentences)
        .collect();

    if sentences.is_empty() {
        None
    } else {
        Some(format!("{}.", sentences.join(". ")))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkMetadata;
    use pdfchat_core::AppError;
    use pdfchat_llm::{LlmResponse, LlmUsage};
    use std::sync::Mutex;

    /// Replies with canned outputs in order and records the prompts it saw.
    struct ScriptedClient {
        replies: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedClient {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            let content = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| AppError::Llm("no reply left".to_string()))?;
            Ok(LlmResponse {
                content,
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    fn chunks() -> Vec<Chunk> {
        let meta = ChunkMetadata::for_upload("cv.pdf", "f1", "/tmp/f1.pdf");
        vec![
            Chunk::new("Skills: Rust, Go and Kubernetes.", meta.clone()),
            Chunk::new("Experience: eight years of backend work.", meta),
        ]
    }

    #[test]
    fn test_clean_drops_repeats_and_short_sentences() {
        let raw = "The candidate knows Rust and Go well from many years of work. Yes. \
                   the candidate knows Rust and Go well from many years of practice. \
                   They ran Kubernetes clusters in production.";
        assert_eq!(
            clean(raw, 5).as_deref(),
            Some(
                "The candidate knows Rust and Go well from many years of work. \
                 They ran Kubernetes clusters in production."
            )
        );
        assert!(clean("Ok. Yes. No.", 5).is_none());
    }

    #[test]
    fn test_clean_caps_sentence_count() {
        let raw = (0..8)
            .map(|i| format!("Distinct sentence number {} about the work", i))
            .collect::<Vec<_>>()
            .join(". ");
        let cleaned = clean(&raw, 5).unwrap();
        assert_eq!(cleaned.matches('.').count(), 5);
        assert!(cleaned.ends_with("number 4 about the work."));
    }

    #[tokio::test]
    async fn test_generate_prompts_with_context() {
        let client = ScriptedClient::new(&[
            "She has used Rust, Go and Kubernetes across eight years of backend work.",
        ]);
        let generator = AnswerGenerator::new(client.clone(), LlmConfig::default());

        let answer = generator.generate("What skills?", &chunks()).await.unwrap();
        assert_eq!(
            answer,
            "She has used Rust, Go and Kubernetes across eight years of backend work."
        );

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Question: What skills?\n\nContext: Skills: Rust"));
        assert!(prompts[0].contains("Go and Kubernetes.\nExperience:"));
        assert!(prompts[0].ends_with("Do not repeat information:"));
    }

    #[tokio::test]
    async fn test_short_answer_is_retried() {
        let client = ScriptedClient::new(&[
            "Rust.",
            "The document lists Rust, Go and Kubernetes as core skills. \
             It also mentions eight years of backend work. \
             Backend work spans eight years in total. \
             A fourth sentence that should be dropped.",
        ]);
        let generator = AnswerGenerator::new(client.clone(), LlmConfig::default());

        let answer = generator.generate("What skills?", &chunks()).await.unwrap();
        assert_eq!(answer.matches('.').count(), 3);
        assert!(answer.starts_with("The document lists Rust"));

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].starts_with("Based on this information: Skills:"));
        assert!(prompts[1].contains("Answer this question: What skills?"));
    }

    #[tokio::test]
    async fn test_client_failure_propagates() {
        let generator = AnswerGenerator::new(ScriptedClient::new(&[]), LlmConfig::default());
        let err = generator.generate("What skills?", &chunks()).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }
}
