//! Extractive answer synthesis.
//!
//! Answers are assembled from the retrieved text itself: near-duplicate
//! chunks are dropped, the first few survivors are combined, an intent
//! specific lead-in is prepended and the body is trimmed to a handful of
//! sentences.

use super::intent::{Intent, IntentClassifier, KeywordIntentClassifier};
use super::skills::{SkillExtractor, VocabularySkillExtractor};
use crate::types::Chunk;
use std::collections::HashSet;
use std::sync::Arc;

/// Answer body when nothing usable was retrieved.
pub const NO_INFORMATION: &str = "No relevant information found.";

/// Leading words compared when looking for duplicate chunks.
const DEDUP_KEY_WORDS: usize = 20;
/// Chunks this short (after trimming) carry no content.
const MIN_CHUNK_CHARS: usize = 10;
/// Chunks combined into one answer.
const MAX_COMBINED_CHUNKS: usize = 2;
/// Shorter sentences are dropped from the answer.
const MIN_SENTENCE_CHARS: usize = 20;
const MAX_SENTENCES: usize = 5;

#[derive(Clone)]
pub struct AnswerSynthesizer {
    classifier: Arc<dyn IntentClassifier>,
    skills: Arc<dyn SkillExtractor>,
}

impl Default for AnswerSynthesizer {
    fn default() -> Self {
        Self::new(
            Arc::new(KeywordIntentClassifier::default()),
            Arc::new(VocabularySkillExtractor::default()),
        )
    }
}

impl AnswerSynthesizer {
    pub fn new(classifier: Arc<dyn IntentClassifier>, skills: Arc<dyn SkillExtractor>) -> Self {
        Self { classifier, skills }
    }

    /// Build an answer to `question` from `chunks`, given best first.
    pub fn synthesize(&self, question: &str, chunks: &[Chunk]) -> String {
        let unique = dedup(chunks);
        if unique.is_empty() {
            return NO_INFORMATION.to_string();
        }

        let mut content = unique
            .into_iter()
            .take(MAX_COMBINED_CHUNKS)
            .collect::<Vec<_>>()
            .join("\n\n");

        let intent = self.classifier.classify(question);
        if intent == Intent::Skills {
            content = self.skills.extract(&content);
        }

        tracing::debug!("Synthesizing {:?} answer from {} chunks", intent, chunks.len());
        format!("{}\n\n{}", intent.lead_in(), condense(&content))
    }
}

/// Trimmed chunk texts, first occurrence per leading-words key.
fn dedup(chunks: &[Chunk]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for chunk in chunks {
        let text = chunk.text.trim();
        if text.chars().count() <= MIN_CHUNK_CHARS {
            continue;
        }

        let key = text
            .split_whitespace()
            .take(DEDUP_KEY_WORDS)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if seen.insert(key) {
            unique.push(text);
        }
    }

    unique
}

/// Collapse whitespace and keep the first few substantial sentences.
fn condense(content: &str) -> String {
    let cleaned = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let sentences: Vec<&str> = cleaned
        .split('.')
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .take(MAX_SENTENCES)
        .collect();

    format!("{}.", sentences.join(". "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkMetadata;

    fn chunk(text: &str) -> Chunk {
        Chunk::new(text, ChunkMetadata::for_upload("resume.pdf", "f1", "/tmp/f1.pdf"))
    }

    #[test]
    fn test_empty_chunks() {
        let synth = AnswerSynthesizer::default();
        assert_eq!(synth.synthesize("anything", &[]), NO_INFORMATION);
    }

    #[test]
    fn test_only_tiny_chunks() {
        let synth = AnswerSynthesizer::default();
        let chunks = vec![chunk("  short  "), chunk("0123456789")];
        assert_eq!(synth.synthesize("anything", &chunks), NO_INFORMATION);
    }

    #[test]
    fn test_duplicate_chunk_is_ignored() {
        let synth = AnswerSynthesizer::default();
        let a = chunk("Led the migration of billing services to a new platform. Reduced costs by a third over two years.");

        let once = synth.synthesize("Tell me about the migration", &[a.clone()]);
        let twice = synth.synthesize("Tell me about the migration", &[a.clone(), a]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_dedup_key_is_case_insensitive_prefix() {
        let words: Vec<String> = (0..20).map(|i| format!("word{}", i)).collect();
        let prefix = words.join(" ");
        let chunks = vec![
            chunk(&format!("{} first tail", prefix)),
            chunk(&format!("{} second tail", prefix.to_uppercase())),
            chunk("An entirely different passage of text"),
        ];

        let unique = dedup(&chunks);
        assert_eq!(unique.len(), 2);
        assert!(unique[0].ends_with("first tail"));
        assert!(unique[1].starts_with("An entirely"));
    }

    #[test]
    fn test_only_first_two_chunks_used() {
        let synth = AnswerSynthesizer::default();
        let chunks = vec![
            chunk("The first chunk talks about distributed systems."),
            chunk("The second chunk covers database replication."),
            chunk("The third chunk mentions gardening at length."),
        ];

        let answer = synth.synthesize("Where is the office?", &chunks);
        assert!(answer.starts_with("Based on the document, here is the relevant information:\n\n"));
        assert!(answer.contains("distributed systems"));
        assert!(answer.contains("database replication"));
        assert!(!answer.contains("gardening"));
    }

    #[test]
    fn test_condense_limits_sentences() {
        let text = "Sentence number one is long enough. Too short. \
            Sentence number two is long enough.\n\nSentence number three is long enough. \
            Sentence number four is long enough. Sentence number five is long enough. \
            Sentence number six is long enough.";

        assert_eq!(
            condense(text),
            "Sentence number one is long enough. Sentence number two is long enough. \
             Sentence number three is long enough. Sentence number four is long enough. \
             Sentence number five is long enough."
        );
    }

    #[test]
    fn test_skills_question_uses_extractor() {
        let synth = AnswerSynthesizer::default();
        let chunks = vec![chunk("Experienced in Python and React.js development")];

        let answer = synth.synthesize("What skills are listed?", &chunks);
        let (lead_in, body) = answer.split_once("\n\n").unwrap();
        assert_eq!(lead_in, Intent::Skills.lead_in());
        assert!(body.starts_with("Skills found: "));
        assert!(body.contains("Python"));
        assert!(body.contains("React"));
        assert!(body.ends_with('.'));
    }

    #[test]
    fn test_non_skill_question_keeps_text() {
        let synth = AnswerSynthesizer::default();
        let chunks = vec![chunk("Worked at Initech as a senior engineer for five years.")];

        let answer = synth.synthesize("What work experience?", &chunks);
        assert_eq!(
            answer,
            "Based on the document, here is the experience/work history:\n\n\
             Worked at Initech as a senior engineer for five years."
        );
    }
}
