//! Verse generation: prompts, the generation and validation stages, and
//! the retry loop that ties them to corpus retrieval.

mod error;
mod generator;
mod orchestrator;
pub mod prompts;
mod types;
mod validator;

pub use error::GenerationError;
pub use generator::{parse_verses, VerseGenerator};
pub use orchestrator::{PipelineContext, RhymeGenerator};
pub use types::{
    AttemptRecord, CostSummary, CriteriaScores, GenerationAttempt, GenerationRequest,
    GenerationResult, Outcome, ReviewSource, ServiceStatus, ValidationOutcome, VerseDraft,
};
pub use validator::{heuristic_review, QualityValidator};
