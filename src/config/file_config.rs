use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_path: Option<String>,
    pub read_pool_size: Option<usize>,

    // Pipeline sections
    pub generator: Option<GeneratorConfig>,
    pub pricing: Option<PricingConfig>,
    pub generation_provider: Option<ProviderConfig>,
    pub validation_provider: Option<ProviderConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct GeneratorConfig {
    pub max_attempts: Option<u32>,
    pub min_score: Option<f64>,
    pub lyrics_to_fetch: Option<usize>,
    pub base_temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub presence_penalty: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub attempt_timeout_secs: Option<u64>,
    pub pipeline_timeout_secs: Option<u64>,
    pub use_corpus_rhymes: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct PricingConfig {
    /// USD per 1000 input tokens.
    pub input_usd_per_1k: Option<f64>,
    /// USD per 1000 output tokens.
    pub output_usd_per_1k: Option<f64>,
    pub usd_to_brl: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider type: "openai", "ollama" or "none"
    pub kind: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// Shell command printing the API key, run before each request.
    pub api_key_command: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let config: FileConfig = toml::from_str(
            r#"
            db_path = "/data/rimas.db"
            read_pool_size = 4

            [generator]
            max_attempts = 5
            min_score = 6.5
            use_corpus_rhymes = false

            [pricing]
            usd_to_brl = 5.0

            [generation_provider]
            kind = "ollama"
            model = "qwen2.5:7b"

            [validation_provider]
            kind = "none"
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path.as_deref(), Some("/data/rimas.db"));
        assert_eq!(config.read_pool_size, Some(4));
        let generator = config.generator.unwrap();
        assert_eq!(generator.max_attempts, Some(5));
        assert_eq!(generator.min_score, Some(6.5));
        assert_eq!(generator.use_corpus_rhymes, Some(false));
        assert!(generator.lyrics_to_fetch.is_none());
        assert_eq!(config.pricing.unwrap().usd_to_brl, Some(5.0));
        assert_eq!(
            config.generation_provider.unwrap().model.as_deref(),
            Some("qwen2.5:7b")
        );
        assert_eq!(
            config.validation_provider.unwrap().kind.as_deref(),
            Some("none")
        );
    }

    #[test]
    fn test_empty_file_is_valid() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.db_path.is_none());
        assert!(config.generator.is_none());
    }

    #[test]
    fn test_load_reports_path_on_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rimas.toml");
        std::fs::write(&path, "read_pool_size = \"many\"").unwrap();
        let err = FileConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }
}
