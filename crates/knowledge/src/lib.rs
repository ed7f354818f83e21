//! PDF question answering.
//!
//! Documents are extracted to page-tagged text, chunked, embedded and
//! stored in a LanceDB collection. Questions are answered from the closest
//! chunks, with page citations, either extractively or by a language model.

pub mod chunker;
pub mod embeddings;
pub mod extract;
pub mod ingest;
pub mod lancedb_index;
pub mod rag;
pub mod store;
pub mod types;
pub mod uploads;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use chunker::Chunker;
pub use extract::{PdftotextExtractor, TextExtractor};
pub use ingest::DocumentIngestor;
pub use rag::{
    AnswerGenerator, AnswerResult, AnswerSynthesizer, Citation, DocumentSummary, QaService,
};
pub use store::VectorStore;
pub use types::{
    Chunk, ChunkMetadata, CollectionStats, MetadataFilter, UploadRecord, UploadReport,
};
pub use uploads::UploadTracker;

use pdfchat_core::AppConfig;
use pdfchat_core::AppResult;
use std::sync::Arc;

/// The components a process needs, built once from configuration.
pub struct KnowledgeBase {
    pub store: Arc<VectorStore>,
    pub ingestor: DocumentIngestor,
    pub qa: QaService,
}

impl KnowledgeBase {
    /// Open the configured index (creating it if absent) and wire the
    /// ingestion and answering components around it.
    pub async fn open(config: &AppConfig) -> AppResult<Self> {
        let embedder = embeddings::create_provider(&config.embedding).await?;
        tracing::debug!(
            "Using embedding provider {} ({}, {} dims)",
            embedder.provider_name(),
            embedder.model_name(),
            embedder.dimensions()
        );

        let store = VectorStore::open_lancedb(embedder, &config.index_dir(), &config.index.collection)
            .await?
            .with_batch_size(config.embedding.batch_size);
        let store = Arc::new(store);

        let ingestor = DocumentIngestor::from_config(
            config,
            Arc::clone(&store),
            Arc::new(PdftotextExtractor::default()),
        )?;

        let generator =
            AnswerGenerator::new(pdfchat_llm::create_client(&config.llm)?, config.llm.clone());

        let qa = QaService::new(store.clone(), AnswerSynthesizer::default())
            .with_top_k(config.retrieval.top_k)
            .with_citation_limit(config.retrieval.citation_limit)
            .with_generator(generator);

        Ok(Self { store, ingestor, qa })
    }
}
