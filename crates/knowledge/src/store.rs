//! Embedding-aware vector store.
//!
//! Pairs an [`EmbeddingProvider`] with a [`VectorIndex`]: chunks go in as
//! text and come back out ranked by similarity to a text query.

use crate::embeddings::{EmbeddingManifest, EmbeddingProvider};
use crate::lancedb_index::LanceDbIndex;
use crate::types::{Chunk, CollectionStats, IndexedChunk, MetadataFilter};
use crate::vector_index::VectorIndex;
use pdfchat_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

const DEFAULT_BATCH_SIZE: usize = 64;

pub struct VectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    batch_size: usize,
}

impl VectorStore {
    /// Wrap an index. The index is not initialized here.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Open (loading or creating) the LanceDB collection `collection` in
    /// `index_dir`, pinned to `embedder`'s model.
    pub async fn open_lancedb(
        embedder: Arc<dyn EmbeddingProvider>,
        index_dir: &Path,
        collection: &str,
    ) -> AppResult<Self> {
        let current = EmbeddingManifest::describe(embedder.as_ref());
        if let Some(stored) = EmbeddingManifest::load(index_dir)? {
            stored.validate_consistency(&current)?;
        }

        let index = LanceDbIndex::new(index_dir, collection, embedder.dimensions());
        let store = Self::new(embedder, Arc::new(index));
        store.init().await?;
        current.save(index_dir)?;
        Ok(store)
    }

    /// Load or create the backing collection. Idempotent.
    pub async fn init(&self) -> AppResult<()> {
        if self.embedder.dimensions() != self.index.dimensions() {
            return Err(AppError::Config(format!(
                "Embedding provider yields {} dimensions but the index expects {}",
                self.embedder.dimensions(),
                self.index.dimensions()
            )));
        }
        self.index.init().await
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Embed and store `chunks`; returns the id assigned to each, in order.
    pub async fn insert(&self, chunks: Vec<Chunk>) -> AppResult<Vec<String>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embedder.embed_batch(batch).await?);
        }
        if embeddings.len() != chunks.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let rows: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk {
                id: uuid::Uuid::new_v4().to_string(),
                chunk,
                embedding,
            })
            .collect();

        self.index.add(&rows).await?;

        tracing::info!("Added {} chunks to '{}'", rows.len(), self.index.name());
        Ok(rows.into_iter().map(|row| row.id).collect())
    }

    /// The `k` chunks most similar to `query`, best first.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<(Chunk, f32)>> {
        let embedding = self.embedder.embed(query).await?;
        let hits = self.index.nearest(&embedding, k).await?;

        tracing::debug!("Search for {:?} returned {} chunks", query, hits.len());
        Ok(hits
            .into_iter()
            .map(|(row, score)| (row.chunk, score))
            .collect())
    }

    pub async fn stats(&self) -> AppResult<CollectionStats> {
        Ok(CollectionStats {
            count: self.index.count().await?,
            name: self.index.name().to_string(),
            location: self.index.location(),
        })
    }

    /// Remove every stored chunk.
    pub async fn clear(&self) -> AppResult<usize> {
        self.index.delete_all().await
    }

    /// Remove chunks whose metadata matches every pair in `filter`.
    pub async fn delete_by_metadata(&self, filter: &MetadataFilter) -> AppResult<usize> {
        self.index.delete_where(filter).await
    }

    /// Up to `limit` stored chunks.
    pub async fn sample(&self, limit: usize) -> AppResult<Vec<Chunk>> {
        Ok(self
            .index
            .sample(limit)
            .await?
            .into_iter()
            .map(|row| row.chunk)
            .collect())
    }
}
