//! LLM provider factory.

use crate::client::LlmClient;
use crate::providers::ollama::{OllamaClient, DEFAULT_OLLAMA_URL};
use pdfchat_core::config::LlmConfig;
use pdfchat_core::{AppError, AppResult};
use std::sync::Arc;

/// Build the client named by `config.provider`. No request is made.
pub fn create_client(config: &LlmConfig) -> AppResult<Arc<dyn LlmClient>> {
    match config.provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = config.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaClient::with_base_url(base_url)))
        }
        other => Err(AppError::Config(format!(
            "Unknown LLM provider: '{}'. Supported providers: ollama",
            other
        ))),
    }
}
