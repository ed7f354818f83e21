//! End-to-end tests: chunk, index, retrieve, answer.

use crate::chunker::Chunker;
use crate::embeddings::providers::trigram::TrigramProvider;
use crate::rag::{
    AnswerGenerator, AnswerMethod, AnswerSynthesizer, QaService, Retriever, NO_INFORMATION,
};
use crate::store::VectorStore;
use crate::types::{Chunk, ChunkMetadata, MetadataFilter};
use pdfchat_core::config::LlmConfig;
use pdfchat_core::{AppError, AppResult};
use pdfchat_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::sync::Arc;
use tempfile::TempDir;

const RESUME_SECTIONS: [&str; 5] = [
    "Contact: jane.doe@example.com, phone 555-0100, Berlin.",
    "Skills: Python, Rust, Docker, Kubernetes and PostgreSQL. Strong skills in API design.",
    "Experience: Senior engineer at Initech building payment services for six years.",
    "Education: BSc in Computer Science from the Technical University of Munich.",
    "Interests: long distance running, chess and woodworking on weekends.",
];

async fn open_store(temp: &TempDir) -> Arc<VectorStore> {
    let store = VectorStore::open_lancedb(
        Arc::new(TrigramProvider::new(384)),
        &temp.path().join("index"),
        "documents",
    )
    .await
    .unwrap();
    Arc::new(store)
}

fn resume_chunks() -> Vec<Chunk> {
    RESUME_SECTIONS
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let metadata = ChunkMetadata::for_upload("resume.pdf", "resume-1", "/uploads/resume-1.pdf")
                .with_page(i as u32 + 1);
            Chunk::new(*text, metadata)
        })
        .collect()
}

#[tokio::test]
async fn test_resume_skills_question() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp).await;
    store.insert(resume_chunks()).await.unwrap();

    let qa = QaService::new(store, AnswerSynthesizer::default()).with_top_k(3);
    let result = qa.ask("skills").await;

    assert!(result
        .answer
        .starts_with("Based on the document, here are the skills mentioned:"));
    assert!(!result.citations.is_empty());
    assert!(result.citations.len() <= 3);
    assert!(result.citations.iter().all(|c| c.filename == "resume.pdf"));
    assert_eq!(result.method, AnswerMethod::VectorSearch);
    assert_eq!(result.question, "skills");
}

#[tokio::test]
async fn test_skills_chunk_ranks_first() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp).await;
    store.insert(resume_chunks()).await.unwrap();

    let hits = store.search("What skills are listed?", 3).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits[0].0.text.starts_with("Skills:"));
    assert!(hits.windows(2).all(|w| w[0].1 >= w[1].1));
}

#[tokio::test]
async fn test_exact_text_round_trip() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp).await;
    store.insert(resume_chunks()).await.unwrap();

    for section in RESUME_SECTIONS {
        let hits = store.search(section, 3).await.unwrap();
        assert!(
            hits.iter().any(|(chunk, _)| chunk.text == section),
            "{:?} not retrieved by its own text",
            section
        );
    }
}

#[tokio::test]
async fn test_chunked_document_carries_pages() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp).await;

    let text = format!(
        "{}\n{}\n\n{}\n{}",
        crate::extract::page_marker(1),
        "Summary of a long career in backend engineering.",
        crate::extract::page_marker(2),
        "References available upon request from former managers."
    );
    let chunker = Chunker::new(60, 0).unwrap();
    let chunks = chunker
        .split(&text, &ChunkMetadata::for_upload("cv.pdf", "cv-1", "/uploads/cv-1.pdf"))
        .unwrap();
    assert_eq!(chunks.len(), 2);
    store.insert(chunks).await.unwrap();

    let hits = store.search("References available upon request", 1).await.unwrap();
    assert_eq!(hits[0].0.metadata.page, Some(2));
}

#[tokio::test]
async fn test_empty_index() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp).await;

    assert!(store.search("anything", 3).await.unwrap().is_empty());
    assert_eq!(AnswerSynthesizer::default().synthesize("anything", &[]), NO_INFORMATION);

    let qa = QaService::new(store, AnswerSynthesizer::default());
    let result = qa.ask("anything").await;
    assert!(result.answer.starts_with("I couldn't find any relevant information"));
    assert!(result.citations.is_empty());
}

#[tokio::test]
async fn test_duplicate_chunks_answer_like_one() {
    let temp = TempDir::new().unwrap();
    let single = open_store(&temp).await;
    let chunk = resume_chunks().remove(2);
    single.insert(vec![chunk.clone()]).await.unwrap();

    let other = TempDir::new().unwrap();
    let doubled = open_store(&other).await;
    doubled.insert(vec![chunk.clone(), chunk]).await.unwrap();

    let question = "Tell me about the work history";
    let one = QaService::new(single, AnswerSynthesizer::default()).ask(question).await;
    let two = QaService::new(doubled, AnswerSynthesizer::default()).ask(question).await;
    assert_eq!(one.answer, two.answer);
}

#[tokio::test]
async fn test_delete_by_file_id_then_search() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp).await;
    store.insert(resume_chunks()).await.unwrap();
    store
        .insert(vec![Chunk::new(
            "Cover letter expressing interest in the platform team.",
            ChunkMetadata::for_upload("letter.pdf", "letter-1", "/uploads/letter-1.pdf"),
        )])
        .await
        .unwrap();

    let removed = store
        .delete_by_metadata(&MetadataFilter::file_id("resume-1"))
        .await
        .unwrap();
    assert_eq!(removed, 5);

    let hits = store.search("skills", 5).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0.metadata.filename, "letter.pdf");
}

/// Answers with the first line of context it was given.
struct ContextEchoClient;

#[async_trait::async_trait]
impl LlmClient for ContextEchoClient {
    fn provider_name(&self) -> &str {
        "context-echo"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let context = request
            .prompt
            .split("Context: ")
            .nth(1)
            .and_then(|rest| rest.lines().next())
            .unwrap_or_default();
        Ok(LlmResponse {
            content: format!("According to the document the answer is in this section: {}", context),
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

#[tokio::test]
async fn test_generated_answer_uses_best_chunk() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp).await;
    store.insert(resume_chunks()).await.unwrap();

    let qa = QaService::new(store, AnswerSynthesizer::default()).with_generator(
        AnswerGenerator::new(Arc::new(ContextEchoClient), LlmConfig::default()),
    );
    let result = qa.ask_generated("What skills are listed?").await;

    assert_eq!(result.method, AnswerMethod::Llm);
    assert!(result.answer.contains("Skills: Python, Rust, Docker"));
    assert_eq!(result.citations.len(), 1);
    assert_eq!(result.citations[0].page, 2);
}

struct BrokenRetriever;

#[async_trait::async_trait]
impl Retriever for BrokenRetriever {
    async fn retrieve(&self, _query: &str, _k: usize) -> AppResult<Vec<(Chunk, f32)>> {
        Err(AppError::Storage("disk on fire".to_string()))
    }

    async fn sample(&self, _limit: usize) -> AppResult<Vec<Chunk>> {
        Err(AppError::Storage("disk on fire".to_string()))
    }

    async fn count(&self) -> AppResult<usize> {
        Err(AppError::Storage("disk on fire".to_string()))
    }
}

#[tokio::test]
async fn test_retrieval_failure_is_apologetic() {
    let qa = QaService::new(Arc::new(BrokenRetriever), AnswerSynthesizer::default());

    let result = qa.ask("skills").await;
    assert!(result.answer.starts_with("I'm sorry"));
    assert!(result.citations.is_empty());

    let err = qa.try_ask("skills").await.unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));

    assert!(qa.document_summary().await.is_err());
}
