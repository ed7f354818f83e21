//! Error types for pdfchat.
//!
//! A single error enum covers every failure category of the pipeline:
//! configuration, I/O, document processing, index lifecycle, storage,
//! embedding, language model calls and answer synthesis.

use thiserror::Error;

/// Unified error type for pdfchat.
///
/// All fallible functions return `Result<T, AppError>`. Payloads carry the
/// formatted message of the underlying cause.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Upload validation, text extraction or chunking failed
    #[error("Processing error: {0}")]
    Processing(String),

    /// The vector index was used before it was created or loaded
    #[error("Vector store not initialized: {0}")]
    NotInitialized(String),

    /// Durable storage failures (LanceDB, Arrow conversion)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Embedding provider failures
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Answer generation failures
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Language model provider failures
    #[error("LLM error: {0}")]
    Llm(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
