//! Retrieval-augmented answering.
//!
//! Questions are answered extractively from retrieved chunks by default.
//! [`QaService::ask_generated`] hands the same chunks to a language model
//! instead.

pub mod citations;
pub mod generator;
pub mod intent;
pub mod retriever;
pub mod service;
pub mod skills;
pub mod synthesizer;
pub mod types;

pub use citations::build_citations;
pub use generator::AnswerGenerator;
pub use intent::{Intent, IntentClassifier, KeywordIntentClassifier};
pub use retriever::Retriever;
pub use service::QaService;
pub use skills::{SkillExtractor, VocabularySkillExtractor};
pub use synthesizer::{AnswerSynthesizer, NO_INFORMATION};
pub use types::{AnswerMethod, AnswerResult, Citation, DocumentSummary};
