//! LLM provider trait definition.

use super::types::{CompletionResponse, Message};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Options for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Penalises tokens that already appeared at all.
    pub presence_penalty: Option<f32>,
    /// Penalises tokens proportionally to how often they appeared.
    pub frequency_penalty: Option<f32>,
    /// Ask the provider to answer with a single JSON object.
    pub json_response: bool,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: None,
            presence_penalty: None,
            frequency_penalty: None,
            json_response: false,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Errors that can occur when interacting with an LLM provider.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,
}

impl LlmError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else if e.is_decode() {
            LlmError::InvalidResponse(e.to_string())
        } else {
            LlmError::Connection(e.to_string())
        }
    }

    /// HTTP-like status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Api { status, .. } => Some(*status),
            LlmError::RateLimited => Some(429),
            LlmError::Connection(_) | LlmError::InvalidResponse(_) | LlmError::Timeout => None,
        }
    }
}

/// Trait for LLM providers.
///
/// Implementations connect to different backends (OpenAI-compatible APIs,
/// Ollama) behind one interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider's name (e.g., "ollama", "openai").
    fn name(&self) -> &str;

    /// Get the model being used.
    fn model(&self) -> &str;

    /// Complete a conversation.
    ///
    /// # Arguments
    /// * `messages` - The conversation history.
    /// * `options` - Completion options (temperature, penalties, timeout, etc.).
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError>;

    /// Check if the provider is healthy and reachable.
    async fn health_check(&self) -> Result<(), LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status() {
        let cases = [
            (LlmError::Connection("refused".to_string()), None),
            (
                LlmError::Api {
                    status: 502,
                    message: "bad gateway".to_string(),
                },
                Some(502),
            ),
            (LlmError::InvalidResponse("empty".to_string()), None),
            (LlmError::RateLimited, Some(429)),
            (LlmError::Timeout, None),
        ];
        for (error, status) in cases {
            assert_eq!(error.status(), status, "{}", error);
        }
    }
}
