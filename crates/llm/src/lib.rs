//! Language model access for pdfchat.
//!
//! A provider-agnostic [`LlmClient`] trait plus the providers behind it.
//! Only Ollama is implemented; [`create_client`] picks one from
//! [`pdfchat_core::config::LlmConfig`].

pub mod client;
pub mod factory;
pub mod providers;

pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::OllamaClient;
