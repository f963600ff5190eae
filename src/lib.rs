//! Rimas Generator Library
//!
//! Corpus storage, retrieval, pattern extraction and the LLM-backed verse
//! generation pipeline. The binaries are thin wrappers around these modules.

pub mod cli_style;
pub mod config;
pub mod corpus;
pub mod generation;
pub mod llm;
pub mod patterns;
pub mod search;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use corpus::SqliteCorpusStore;
pub use generation::{
    GenerationError, GenerationRequest, GenerationResult, PipelineContext, RhymeGenerator,
};
pub use llm::LlmProvider;
pub use search::{LyricRetriever, SqliteLyricRetriever, StyleTag};
