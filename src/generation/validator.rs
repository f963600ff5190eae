//! Verse scoring: rhyme and meter are measured, coherence and originality
//! come from the validation model or, when it cannot answer, from a
//! deterministic heuristic.

use super::prompts::{review_prompt, REVIEW_SYSTEM_PROMPT};
use super::types::{CriteriaScores, GenerationRequest, ReviewSource, ValidationOutcome};
use crate::llm::{CompletionOptions, LlmError, LlmProvider, Message};
use crate::patterns::{classify, is_stopword, last_word, syllables, tokenize, ExtractedPatterns, RhymeKind};
use crate::search::normalize_terms;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const EXPECTED_VERSES: usize = 4;
const METER_MIN_SYLLABLES: usize = 6;
const METER_MAX_SYLLABLES: usize = 16;
const METER_POINTS_PER_LINE: f64 = 2.5;
const RHYME_POINTS_PER_COUPLET: f64 = 5.0;
/// Below this (rhyme + meter) / 2 the semantic review is skipped.
const MIN_BASE_FOR_REVIEW: f64 = 4.0;
const MISSING_REVIEW_VALUE: f64 = 5.0;
const REVIEW_TEMPERATURE: f32 = 0.3;
const REVIEW_MAX_TOKENS: u32 = 150;

lazy_static! {
    static ref JSON_OBJECT: Regex = Regex::new(r"\{[\s\S]*?\}").unwrap();
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Rhyme quality of a couplet in [0, 1]. Missing or identical end words
/// do not rhyme.
fn couplet_quality(line1: &str, line2: &str) -> f64 {
    let (Some(w1), Some(w2)) = (last_word(line1), last_word(line2)) else {
        return 0.0;
    };
    if w1 == w2 {
        return 0.0;
    }
    match classify(&w1, &w2) {
        Some(RhymeKind::Perfect) => 1.0,
        Some(RhymeKind::Consonant) => 0.8,
        Some(RhymeKind::Assonant) => 0.5,
        None => 0.0,
    }
}

/// Rhyme and meter sub-scores plus the problems found.
fn measure(verses: &[String]) -> (f64, f64, Vec<String>) {
    let mut problems = Vec::new();
    if verses.len() != EXPECTED_VERSES {
        problems.push(format!(
            "expected {} verses, got {}",
            EXPECTED_VERSES,
            verses.len()
        ));
    }

    let mut rhyme = 0.0;
    for (a, b) in [(0, 1), (2, 3)] {
        if b >= verses.len() {
            continue;
        }
        let quality = couplet_quality(&verses[a], &verses[b]);
        rhyme += quality * RHYME_POINTS_PER_COUPLET;
        if quality == 0.0 {
            problems.push(format!("verses {}-{} do not rhyme", a + 1, b + 1));
        }
    }

    let mut meter = 0.0;
    for (i, verse) in verses.iter().enumerate() {
        let count = syllables(verse);
        if (METER_MIN_SYLLABLES..=METER_MAX_SYLLABLES).contains(&count) {
            meter += METER_POINTS_PER_LINE;
        } else {
            problems.push(format!(
                "verse {}: {} syllables (expected {}-{})",
                i + 1,
                count,
                METER_MIN_SYLLABLES,
                METER_MAX_SYLLABLES
            ));
        }
    }

    (round1(rhyme), round1(meter), problems)
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 10.0)
}

/// Coherence and originality parsed from the first JSON object in `raw`.
/// `None` when there is no object or it carries neither value.
fn parse_review(raw: &str) -> Option<(f64, f64, String)> {
    let object = JSON_OBJECT.find(raw)?;
    let value: Value = serde_json::from_str(object.as_str()).ok()?;
    let number = |keys: &[&str]| {
        keys.iter().find_map(|k| {
            let v = value.get(*k)?;
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        })
    };
    let coherence = number(&["coerencia", "coherence"]);
    let originality = number(&["originalidade", "originality"]);
    if coherence.is_none() && originality.is_none() {
        return None;
    }
    let feedback = value
        .get("feedback")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("No feedback")
        .to_string();
    Some((
        clamp_score(coherence.unwrap_or(MISSING_REVIEW_VALUE)),
        clamp_score(originality.unwrap_or(MISSING_REVIEW_VALUE)),
        feedback,
    ))
}

fn normalize_line(line: &str) -> String {
    tokenize(line).join(" ")
}

/// Deterministic stand-in for the semantic review.
///
/// Coherence rewards verse words shared with the extracted keywords and
/// vocabulary, plus the theme itself. Originality is lexical variety,
/// minus a penalty for every verse copied from an exemplar.
pub fn heuristic_review(
    verses: &[String],
    theme: &str,
    patterns: &ExtractedPatterns,
) -> (f64, f64) {
    let tokens: Vec<String> = verses.iter().flat_map(|v| tokenize(v)).collect();
    let distinct: HashSet<&str> = tokens.iter().map(String::as_str).collect();

    let reference: HashSet<&str> = patterns
        .keywords
        .iter()
        .chain(patterns.vocabulary.iter())
        .map(String::as_str)
        .collect();
    let hits = distinct
        .iter()
        .filter(|t| t.chars().count() > 3 && !is_stopword(t) && reference.contains(*t))
        .count();
    let theme_present = normalize_terms(theme, None)
        .iter()
        .any(|t| distinct.contains(t.as_str()));
    let coherence = (4.0 + 1.5 * hits.min(4) as f64 + if theme_present { 2.0 } else { 0.0 }).min(10.0);

    let exemplar_lines: HashSet<String> = patterns
        .exemplars
        .iter()
        .flat_map(|e| e.lines().map(normalize_line))
        .collect();
    let copied = verses
        .iter()
        .filter(|v| exemplar_lines.contains(&normalize_line(v)))
        .count();
    let originality = if tokens.is_empty() {
        0.0
    } else {
        10.0 * distinct.len() as f64 / tokens.len() as f64 - 3.0 * copied as f64
    };

    (round1(coherence), round1(clamp_score(originality)))
}

pub struct QualityValidator {
    provider: Option<Arc<dyn LlmProvider>>,
    min_score: f64,
    timeout: Duration,
}

impl QualityValidator {
    /// A validator without provider always uses the heuristic review.
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, min_score: f64, timeout: Duration) -> Self {
        Self {
            provider,
            min_score,
            timeout,
        }
    }

    pub fn provider(&self) -> Option<&Arc<dyn LlmProvider>> {
        self.provider.as_ref()
    }

    pub async fn validate(
        &self,
        verses: &[String],
        request: &GenerationRequest,
        patterns: &ExtractedPatterns,
    ) -> ValidationOutcome {
        let (rhyme, meter, problems) = measure(verses);
        let base = round1((rhyme + meter) / 2.0);

        if base < MIN_BASE_FOR_REVIEW {
            let criteria = CriteriaScores {
                rhyme,
                meter,
                coherence: 0.0,
                originality: 0.0,
            };
            debug!(base = base, "Skipping semantic review");
            return ValidationOutcome {
                score: criteria.aggregate(),
                criteria,
                feedback: format!("Basic metrics too low: {}", problems.join(", ")),
                approved: false,
                problems,
                source: ReviewSource::Skipped,
            };
        }

        let review = match &self.provider {
            Some(provider) => match self.llm_review(provider.as_ref(), verses, request).await {
                Ok(Some(review)) => Some(review),
                Ok(None) => {
                    warn!("Unparseable review from {}, using heuristic", provider.name());
                    None
                }
                Err(e) => {
                    warn!("Validation provider unavailable, using heuristic: {}", e);
                    None
                }
            },
            None => None,
        };

        let (coherence, originality, feedback, source) = match review {
            Some((coherence, originality, feedback)) => {
                (coherence, originality, feedback, ReviewSource::Llm)
            }
            None => {
                let (coherence, originality) = heuristic_review(verses, &request.theme, patterns);
                (
                    coherence,
                    originality,
                    "Heuristic review (validation model unavailable)".to_string(),
                    ReviewSource::Heuristic,
                )
            }
        };

        let criteria = CriteriaScores {
            rhyme,
            meter,
            coherence,
            originality,
        };
        let score = criteria.aggregate();
        ValidationOutcome {
            score,
            criteria,
            feedback,
            approved: score >= self.min_score && verses.len() == EXPECTED_VERSES,
            problems,
            source,
        }
    }

    async fn llm_review(
        &self,
        provider: &dyn LlmProvider,
        verses: &[String],
        request: &GenerationRequest,
    ) -> Result<Option<(f64, f64, String)>, LlmError> {
        let options = CompletionOptions {
            temperature: REVIEW_TEMPERATURE,
            max_tokens: Some(REVIEW_MAX_TOKENS),
            json_response: true,
            timeout: self.timeout,
            ..Default::default()
        };
        let response = provider
            .complete(
                &[
                    Message::system(REVIEW_SYSTEM_PROMPT),
                    Message::user(review_prompt(verses, &request.theme, request.style)),
                ],
                &options,
            )
            .await?;
        Ok(parse_review(&response.message.content))
    }
}
