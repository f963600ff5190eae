//! Builds providers from configuration.

use super::{LlmProvider, OllamaProvider, OpenAIProvider};
use crate::config::{ProviderKind, ProviderSettings};
use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::info;

/// Create an LLM provider for the given settings.
///
/// Returns `None` for `ProviderKind::None`.
pub fn create_provider(settings: &ProviderSettings) -> Result<Option<Arc<dyn LlmProvider>>> {
    let provider: Arc<dyn LlmProvider> = match settings.kind {
        ProviderKind::None => return Ok(None),
        ProviderKind::Ollama => {
            info!(
                "Using Ollama provider at {} (model {})",
                settings.base_url, settings.model
            );
            Arc::new(OllamaProvider::new(&settings.base_url, &settings.model))
        }
        ProviderKind::Openai => {
            info!(
                "Using OpenAI-compatible provider at {} (model {})",
                settings.base_url, settings.model
            );
            match (&settings.api_key, &settings.api_key_command) {
                (_, Some(command)) => Arc::new(OpenAIProvider::with_key_command(
                    &settings.base_url,
                    &settings.model,
                    command.clone(),
                )),
                (Some(key), None) => Arc::new(OpenAIProvider::new(
                    &settings.base_url,
                    &settings.model,
                    Some(key.clone()),
                )),
                (None, None) => bail!(
                    "No API key for the OpenAI provider at {}: set OPENAI_API_KEY, api_key or api_key_command",
                    settings.base_url
                ),
            }
        }
    };
    Ok(Some(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(kind: ProviderKind) -> ProviderSettings {
        ProviderSettings {
            kind,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:latest".to_string(),
            api_key: None,
            api_key_command: None,
        }
    }

    #[test]
    fn test_none_kind_creates_nothing() {
        assert!(create_provider(&settings(ProviderKind::None))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let provider = create_provider(&settings(ProviderKind::Ollama))
            .unwrap()
            .unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model(), "llama3.2:latest");
    }

    #[test]
    fn test_openai_requires_a_key() {
        let Err(err) = create_provider(&settings(ProviderKind::Openai)) else {
            panic!("openai provider without a key should be rejected");
        };
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let mut with_key = settings(ProviderKind::Openai);
        with_key.api_key = Some("sk-test".to_string());
        let provider = create_provider(&with_key).unwrap().unwrap();
        assert_eq!(provider.name(), "openai");
    }
}
