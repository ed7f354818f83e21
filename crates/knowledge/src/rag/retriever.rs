//! Query-time retrieval seam between answering and storage.

use crate::store::VectorStore;
use crate::types::Chunk;
use pdfchat_core::AppResult;

/// Source of ranked chunks for a question.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `k` chunks, best match first, with their similarity.
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<(Chunk, f32)>>;

    /// Up to `limit` stored chunks in no particular order.
    async fn sample(&self, limit: usize) -> AppResult<Vec<Chunk>>;

    /// Number of stored chunks.
    async fn count(&self) -> AppResult<usize>;
}

#[async_trait::async_trait]
impl Retriever for VectorStore {
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<(Chunk, f32)>> {
        self.search(query, k).await
    }

    async fn sample(&self, limit: usize) -> AppResult<Vec<Chunk>> {
        VectorStore::sample(self, limit).await
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.stats().await?.count)
    }
}
