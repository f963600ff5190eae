mod file_config;

pub use file_config::{FileConfig, GeneratorConfig, PricingConfig, ProviderConfig};

use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "data/rimas.db";
pub const DEFAULT_READ_POOL_SIZE: usize = 2;

pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3.2:latest";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub read_pool_size: Option<usize>,
    pub max_attempts: Option<u32>,
    pub min_score: Option<f64>,
    /// Used by OpenAI providers that have no key of their own.
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    Openai,
    Ollama,
    None,
}

impl ProviderKind {
    fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => OLLAMA_DEFAULT_BASE_URL,
            ProviderKind::Openai | ProviderKind::None => OPENAI_DEFAULT_BASE_URL,
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => OLLAMA_DEFAULT_MODEL,
            ProviderKind::Openai | ProviderKind::None => OPENAI_DEFAULT_MODEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    pub max_attempts: u32,
    /// Minimum aggregate score (0-10) for approval.
    pub min_score: f64,
    pub lyrics_to_fetch: usize,
    pub base_temperature: f32,
    pub max_output_tokens: u32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub attempt_timeout: Duration,
    pub pipeline_timeout: Duration,
    /// Merge stored rhyme pairs of the retrieved lyrics into the extracted ones.
    pub use_corpus_rhymes: bool,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_score: 7.0,
            lyrics_to_fetch: 10,
            base_temperature: 0.8,
            max_output_tokens: 200,
            presence_penalty: 0.3,
            frequency_penalty: 0.5,
            attempt_timeout: Duration::from_secs(60),
            pipeline_timeout: Duration::from_secs(180),
            use_corpus_rhymes: true,
        }
    }
}

/// Token prices used for the BRL cost estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub input_usd_per_1k: f64,
    pub output_usd_per_1k: f64,
    pub usd_to_brl: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            input_usd_per_1k: 0.00015,
            output_usd_per_1k: 0.0006,
            usd_to_brl: 5.5,
        }
    }
}

impl Pricing {
    /// Cost in BRL, rounded to four decimal places.
    pub fn cost_brl(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        let usd = (input_tokens as f64 / 1000.0) * self.input_usd_per_1k
            + (output_tokens as f64 / 1000.0) * self.output_usd_per_1k;
        (usd * self.usd_to_brl * 10_000.0).round() / 10_000.0
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_path: PathBuf,
    pub read_pool_size: usize,

    // Pipeline settings (with defaults)
    pub generator: GeneratorSettings,
    pub pricing: Pricing,
    pub generation_provider: ProviderSettings,
    pub validation_provider: ProviderSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let read_pool_size = file
            .read_pool_size
            .or(cli.read_pool_size)
            .unwrap_or(DEFAULT_READ_POOL_SIZE);
        if read_pool_size == 0 {
            bail!("read_pool_size must be at least 1");
        }

        let defaults = GeneratorSettings::default();
        let gen_file = file.generator.unwrap_or_default();
        let generator = GeneratorSettings {
            max_attempts: gen_file
                .max_attempts
                .or(cli.max_attempts)
                .unwrap_or(defaults.max_attempts),
            min_score: gen_file
                .min_score
                .or(cli.min_score)
                .unwrap_or(defaults.min_score),
            lyrics_to_fetch: gen_file.lyrics_to_fetch.unwrap_or(defaults.lyrics_to_fetch),
            base_temperature: gen_file
                .base_temperature
                .unwrap_or(defaults.base_temperature),
            max_output_tokens: gen_file
                .max_output_tokens
                .unwrap_or(defaults.max_output_tokens),
            presence_penalty: gen_file
                .presence_penalty
                .unwrap_or(defaults.presence_penalty),
            frequency_penalty: gen_file
                .frequency_penalty
                .unwrap_or(defaults.frequency_penalty),
            attempt_timeout: gen_file
                .attempt_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.attempt_timeout),
            pipeline_timeout: gen_file
                .pipeline_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.pipeline_timeout),
            use_corpus_rhymes: gen_file
                .use_corpus_rhymes
                .unwrap_or(defaults.use_corpus_rhymes),
        };
        validate_generator(&generator)?;

        let default_pricing = Pricing::default();
        let pricing_file = file.pricing.unwrap_or_default();
        let pricing = Pricing {
            input_usd_per_1k: pricing_file
                .input_usd_per_1k
                .unwrap_or(default_pricing.input_usd_per_1k),
            output_usd_per_1k: pricing_file
                .output_usd_per_1k
                .unwrap_or(default_pricing.output_usd_per_1k),
            usd_to_brl: pricing_file.usd_to_brl.unwrap_or(default_pricing.usd_to_brl),
        };
        if pricing.input_usd_per_1k < 0.0
            || pricing.output_usd_per_1k < 0.0
            || pricing.usd_to_brl <= 0.0
        {
            bail!("pricing values must be positive");
        }

        let generation_provider = resolve_provider(
            file.generation_provider.unwrap_or_default(),
            ProviderKind::Openai,
            cli,
            "generation_provider",
        )?;
        if generation_provider.kind == ProviderKind::None {
            bail!("generation_provider.kind cannot be \"none\"");
        }
        let validation_provider = resolve_provider(
            file.validation_provider.unwrap_or_default(),
            ProviderKind::Ollama,
            cli,
            "validation_provider",
        )?;

        Ok(Self {
            db_path,
            read_pool_size,
            generator,
            pricing,
            generation_provider,
            validation_provider,
        })
    }
}

fn validate_generator(settings: &GeneratorSettings) -> Result<()> {
    if settings.max_attempts < 1 {
        bail!("max_attempts must be at least 1");
    }
    if !(0.0..=10.0).contains(&settings.min_score) {
        bail!("min_score must be between 0 and 10, got {}", settings.min_score);
    }
    if !(0.0..=2.0).contains(&settings.base_temperature) {
        bail!(
            "base_temperature must be between 0 and 2, got {}",
            settings.base_temperature
        );
    }
    if settings.lyrics_to_fetch < 1 {
        bail!("lyrics_to_fetch must be at least 1");
    }
    Ok(())
}

fn resolve_provider(
    file: ProviderConfig,
    default_kind: ProviderKind,
    cli: &CliConfig,
    section: &str,
) -> Result<ProviderSettings> {
    let kind = match file.kind {
        Some(s) => match parse_provider_kind(&s) {
            Some(kind) => kind,
            None => bail!("Invalid {}.kind: {:?} (expected openai, ollama or none)", section, s),
        },
        None => default_kind,
    };

    let api_key = file.api_key.or_else(|| {
        (kind == ProviderKind::Openai)
            .then(|| cli.openai_api_key.clone())
            .flatten()
    });

    Ok(ProviderSettings {
        kind,
        base_url: file
            .base_url
            .unwrap_or_else(|| kind.default_base_url().to_string()),
        model: file
            .model
            .unwrap_or_else(|| kind.default_model().to_string()),
        api_key,
        api_key_command: file.api_key_command,
    })
}

/// Parses a provider kind string.
/// Uses clap's ValueEnum trait for parsing.
fn parse_provider_kind(s: &str) -> Option<ProviderKind> {
    ProviderKind::from_str(s, true).ok()
}
