//! AI drafting client.
//!
//! Turns structured planning facts into prompts, sends them to the
//! provider the caller picked, and returns the provider's raw text.
//! One blocking request per call: no retry, no streaming. Callers on the
//! async side run these under `spawn_blocking`.

pub mod client;
pub mod gemini;
pub mod openai;
pub mod prompt;

pub use client::*;
pub use prompt::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// AI provider, chosen explicitly by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Gemini => "Gemini",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider plus model name, e.g. `{"provider": "gemini", "model": "gemini-1.5-pro"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftingModel {
    pub provider: Provider,
    pub model: String,
}

impl DraftingModel {
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

impl Default for DraftingModel {
    fn default() -> Self {
        Self::new(Provider::OpenAi, "gpt-4o")
    }
}

#[derive(Error, Debug)]
pub enum DraftingError {
    #[error("No API key configured for {0}")]
    MissingApiKey(Provider),

    #[error("Invalid drafting input: {0}")]
    InvalidInput(String),

    #[error("{provider} returned error (status {status}): {message}")]
    Upstream {
        provider: Provider,
        status: u16,
        message: String,
    },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Provider returned an empty completion")]
    EmptyCompletion,
}

/// Text-completion seam. `HttpDraftingClient` in production, mocks in tests.
pub trait LlmClient: Send + Sync {
    /// Single prompt → single completion text.
    fn complete(
        &self,
        model: &DraftingModel,
        system: &str,
        prompt: &str,
    ) -> Result<String, DraftingError>;

    /// Forward a raw OpenAI chat-completions body, injecting the server key.
    fn proxy_chat(&self, body: &serde_json::Value) -> Result<serde_json::Value, DraftingError>;
}

/// Pull a human-readable message out of a provider error payload.
///
/// Both OpenAI and Gemini answer `{"error": {"message": "..."}}`; anything
/// else yields `None` and callers fall back to a generic message.
pub fn provider_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let message = match error {
        serde_json::Value::String(s) => s.clone(),
        other => other.get("message")?.as_str()?.to_string(),
    };
    let message = message.trim().to_string();
    (!message.is_empty()).then_some(message)
}
