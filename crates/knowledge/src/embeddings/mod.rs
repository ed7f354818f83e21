//! Embedding generation.
//!
//! Provider-agnostic text embeddings plus the manifest that pins an index
//! to the model that built it.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingManifest;
pub use provider::{create_provider, normalize, EmbeddingProvider};
