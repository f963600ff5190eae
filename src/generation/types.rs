//! Requests, attempts and results of the generation pipeline.

use crate::corpus::Lyric;
use crate::patterns::ExtractedPatterns;
use crate::search::StyleTag;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub theme: String,
    pub style: StyleTag,
    pub context: Option<String>,
}

impl GenerationRequest {
    pub fn new(theme: impl Into<String>, style: StyleTag) -> Self {
        Self {
            theme: theme.into(),
            style,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = (!context.trim().is_empty()).then_some(context);
        self
    }
}

/// Output of one generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerseDraft {
    /// At most four lines; fewer when the model answered badly.
    pub verses: Vec<String>,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost_brl: f64,
}

/// Token and money totals accumulated over every attempt of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostSummary {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_brl: f64,
}

impl CostSummary {
    pub fn add(&mut self, draft: &VerseDraft) {
        self.input_tokens += draft.input_tokens as u64;
        self.output_tokens += draft.output_tokens as u64;
        self.total_brl = ((self.total_brl + draft.cost_brl) * 10_000.0).round() / 10_000.0;
    }
}

/// Sub-scores on a 0-10 scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CriteriaScores {
    pub rhyme: f64,
    pub meter: f64,
    pub coherence: f64,
    pub originality: f64,
}

impl CriteriaScores {
    /// Weighted aggregate, rounded to one decimal. Non-decreasing in every
    /// criterion.
    pub fn aggregate(&self) -> f64 {
        let score = 0.2 * self.rhyme + 0.2 * self.meter + 0.3 * self.coherence + 0.3 * self.originality;
        (score * 10.0).round() / 10.0
    }
}

/// Where coherence and originality came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSource {
    Llm,
    Heuristic,
    /// Rhyme and meter were too poor to bother.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub score: f64,
    pub criteria: CriteriaScores,
    pub feedback: String,
    pub approved: bool,
    pub problems: Vec<String>,
    pub source: ReviewSource,
}

/// One generate + validate cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationAttempt {
    pub attempt: u32,
    pub temperature: f32,
    pub draft: VerseDraft,
    pub validation: ValidationOutcome,
}

impl GenerationAttempt {
    pub fn is_usable(&self) -> bool {
        !self.draft.verses.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub temperature: f32,
    pub score: Option<f64>,
    /// Accumulated cost after this attempt.
    pub cost_so_far: f64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Approved,
    /// Every attempt was used; the best unapproved attempt is returned.
    Exhausted,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub verses: Vec<String>,
    pub formatted: String,
    pub score: f64,
    /// Attempts made, never more than the configured maximum.
    pub attempts: u32,
    /// Attempt that produced `verses`.
    pub best_attempt: u32,
    pub approved: bool,
    pub outcome: Outcome,
    pub inspiration: Vec<Lyric>,
    pub patterns: ExtractedPatterns,
    pub validation: ValidationOutcome,
    pub cost: CostSummary,
    pub elapsed_ms: u64,
    pub history: Vec<AttemptRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub corpus_ready: bool,
    pub full_text: bool,
    pub validator_reachable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(cost_brl: f64) -> VerseDraft {
        VerseDraft {
            verses: vec![],
            input_tokens: 300,
            output_tokens: 60,
            cost_brl,
        }
    }

    #[test]
    fn test_cost_summary_accumulates() {
        let mut cost = CostSummary::default();
        cost.add(&draft(0.0005));
        cost.add(&draft(0.0004));
        assert_eq!(cost.input_tokens, 600);
        assert_eq!(cost.output_tokens, 120);
        assert_eq!(cost.total_brl, 0.0009);
    }

    #[test]
    fn test_aggregate_is_monotone() {
        let base = CriteriaScores {
            rhyme: 5.0,
            meter: 5.0,
            coherence: 5.0,
            originality: 5.0,
        };
        let bumps = [
            CriteriaScores { rhyme: 6.0, ..base },
            CriteriaScores { meter: 6.0, ..base },
            CriteriaScores { coherence: 6.0, ..base },
            CriteriaScores { originality: 6.0, ..base },
        ];
        for bumped in bumps {
            assert!(bumped.aggregate() >= base.aggregate());
        }
        assert_eq!(base.aggregate(), 5.0);
    }

    #[test]
    fn test_blank_context_is_dropped() {
        let request = GenerationRequest::new("luta", StyleTag::Trap).with_context("  ");
        assert!(request.context.is_none());
        let request = GenerationRequest::new("luta", StyleTag::Trap).with_context("quebrada");
        assert_eq!(request.context.as_deref(), Some("quebrada"));
    }
}
