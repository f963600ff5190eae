//! LLM provider abstraction layer.
//!
//! Verse generation and semantic review talk to language models through
//! the `LlmProvider` trait, so either stage can run against an
//! OpenAI-compatible API or a local Ollama server.

mod factory;
mod ollama;
mod openai;
mod provider;
mod types;

pub use factory::create_provider;
pub use ollama::OllamaProvider;
pub use openai::{ApiKeySource, OpenAIProvider};
pub use provider::{CompletionOptions, LlmError, LlmProvider};
pub use types::{CompletionResponse, FinishReason, Message, MessageRole, TokenUsage};
