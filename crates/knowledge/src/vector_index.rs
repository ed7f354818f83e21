//! Vector index abstraction.
//!
//! The durable storage collaborator behind [`crate::store::VectorStore`]:
//! it persists embedded chunks and answers nearest-neighbour queries, but
//! knows nothing about how embeddings are produced.

use crate::types::{IndexedChunk, MetadataFilter};
use pdfchat_core::AppResult;

/// Trait for vector index backends.
///
/// Every mutating call is committed before it returns, so a later read in
/// the same process observes it. Calls other than `init` fail with
/// `AppError::NotInitialized` until `init` has succeeded.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Collection name
    fn name(&self) -> &str;

    /// Where the collection is persisted
    fn location(&self) -> String;

    /// Embedding dimension every row must have
    fn dimensions(&self) -> usize;

    /// Load the collection if it exists, create it empty otherwise.
    /// Calling it again is a no-op.
    async fn init(&self) -> AppResult<()>;

    /// Append rows in a single commit.
    async fn add(&self, rows: &[IndexedChunk]) -> AppResult<()>;

    /// The `top_k` rows most similar to `query`, best first, with their
    /// cosine similarity.
    async fn nearest(&self, query: &[f32], top_k: usize) -> AppResult<Vec<(IndexedChunk, f32)>>;

    async fn count(&self) -> AppResult<usize>;

    /// Up to `limit` rows in storage order.
    async fn sample(&self, limit: usize) -> AppResult<Vec<IndexedChunk>>;

    /// Remove every row; returns how many were removed.
    async fn delete_all(&self) -> AppResult<usize>;

    /// Remove rows whose metadata matches `filter`; returns how many.
    async fn delete_where(&self, filter: &MetadataFilter) -> AppResult<usize>;
}
