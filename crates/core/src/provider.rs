//! Provider trait, the abstraction over LLM backends.
//!
//! A provider turns a composed prompt pair into raw response text. That is
//! the whole contract: text in, text out, may fail or time out. Everything
//! vendor-specific (auth, wire format, endpoints) stays behind this trait.
//!
//! Implementations: Anthropic, OpenAI-compatible endpoints, and a scripted
//! provider for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// One completion request: the composed prompts plus generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "claude-sonnet-4-20250514", "gpt-4o").
    pub model: String,

    /// The run-level system prompt.
    pub system_prompt: String,

    /// The per-step user prompt.
    pub user_prompt: String,

    /// Temperature (0.0 = deterministic, 1.0 = creative).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The raw generated text. The loop's parser decodes the action plan
    /// out of this.
    pub content: String,

    /// Which model actually responded (may differ from requested).
    pub model: String,

    /// Token usage, when the API reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The loop calls `complete()` without knowing which backend is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get the raw response text.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
