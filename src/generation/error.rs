use crate::llm::LlmError;
use crate::search::StyleTag;
use thiserror::Error;

/// Terminal failures of a generation request.
///
/// Running out of attempts with at least one usable result is not an
/// error: the best attempt is returned with `approved = false`.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No lyrics found for theme {theme:?} in style {style}")]
    EmptyCorpus { theme: String, style: StyleTag },

    #[error("Provider failed on attempt {attempts}: {source}")]
    Provider {
        attempts: u32,
        #[source]
        source: LlmError,
    },

    #[error("All {attempts} attempts failed without producing verses")]
    TotalFailure { attempts: u32 },

    #[error("Corpus error: {0:#}")]
    Corpus(#[from] anyhow::Error),
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::EmptyCorpus { .. } => "EMPTY_CORPUS",
            GenerationError::Provider { .. } => "PROVIDER_ERROR",
            GenerationError::TotalFailure { .. } => "TOTAL_FAILURE",
            GenerationError::Corpus(_) => "CORPUS_ERROR",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            GenerationError::EmptyCorpus { .. } => {
                "Try a broader theme or another style, and check the corpus with `rimas --stats`."
            }
            GenerationError::Provider { .. } => {
                "Check the generation provider settings (base_url, model, OPENAI_API_KEY) and that it is reachable."
            }
            GenerationError::TotalFailure { .. } => {
                "No attempt produced verses. Try again or raise max_attempts."
            }
            GenerationError::Corpus(_) => {
                "Check that the database path is correct and was created with `cli-corpus import`."
            }
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            GenerationError::EmptyCorpus { .. } => 404,
            GenerationError::Provider { .. } => 502,
            GenerationError::TotalFailure { .. } | GenerationError::Corpus(_) => 500,
        }
    }
}
