//! Ollama LLM provider.
//!
//! Non-streaming completions through `POST /api/generate`.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use pdfchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "GenerateOptions::is_empty")]
    options: GenerateOptions,
}

#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl GenerateOptions {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.num_predict.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    model: String,
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Client for a local or remote Ollama server.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Client for the default local server.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_OLLAMA_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_generate_request<'a>(&self, request: &'a LlmRequest) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(
            "Sending {}-char prompt to Ollama model {}",
            request.prompt.chars().count(),
            request.model
        );

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&self.to_generate_request(request))
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        let usage = LlmUsage::new(
            generated.prompt_eval_count.unwrap_or(0),
            generated.eval_count.unwrap_or(0),
        );
        tracing::debug!(
            "Ollama returned {} chars ({} tokens)",
            generated.response.chars().count(),
            usage.completion_tokens
        );

        Ok(LlmResponse {
            content: generated.response,
            model: generated.model,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new();
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.base_url(), "http://localhost:11434");

        let client = OllamaClient::with_base_url("http://gpu-box:11434/");
        assert_eq!(client.base_url(), "http://gpu-box:11434");
    }

    #[test]
    fn test_generate_request_body() {
        let client = OllamaClient::new();
        let request = LlmRequest::new("Hello", "llama3.2")
            .with_temperature(0.5)
            .with_max_tokens(100);

        let body = serde_json::to_value(client.to_generate_request(&request)).unwrap();
        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["prompt"], "Hello");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0.5);
        assert_eq!(body["options"]["num_predict"], 100);

        let bare = LlmRequest::new("Hello", "llama3.2");
        let body = serde_json::to_value(client.to_generate_request(&bare)).unwrap();
        assert!(body.get("options").is_none());
    }

    #[test]
    fn test_parse_generate_response() {
        let raw = r#"{"model":"llama3.2","response":"Paris.","done":true,"eval_count":3}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.response, "Paris.");
        assert_eq!(parsed.eval_count, Some(3));
        assert_eq!(parsed.prompt_eval_count, None);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_llm_error() {
        let client = OllamaClient::with_base_url("http://127.0.0.1:1");
        let err = client
            .complete(&LlmRequest::new("Hello", "llama3.2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }
}
