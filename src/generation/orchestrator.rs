//! The generation pipeline: search, extract, then generate and validate
//! until an attempt is approved or the attempt budget runs out.

use super::error::GenerationError;
use super::generator::VerseGenerator;
use super::prompts::generation_prompt;
use super::types::{
    AttemptRecord, CostSummary, GenerationAttempt, GenerationRequest, GenerationResult, Outcome,
    ServiceStatus, VerseDraft,
};
use super::validator::QualityValidator;
use crate::config::{GeneratorSettings, Pricing};
use crate::corpus::{CorpusStats, Lyric};
use crate::llm::{LlmError, LlmProvider};
use crate::patterns::{ExtractedPatterns, PatternExtractor};
use crate::search::{LyricRetriever, StyleTag};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, timeout_at, Instant as Deadline};
use tracing::{info, warn};

const TEMPERATURE_STEP: f32 = 0.1;
const MAX_TEMPERATURE: f32 = 1.0;
const CORPUS_RHYMES_TO_MERGE: usize = 20;

/// Handles the pipeline depends on. Built once at startup and shared by
/// every request.
#[derive(Clone)]
pub struct PipelineContext {
    pub retriever: Arc<dyn LyricRetriever>,
    pub generation: Arc<dyn LlmProvider>,
    /// `None` runs the validator on the heuristic review only.
    pub validation: Option<Arc<dyn LlmProvider>>,
}

enum PipelineState {
    Searching,
    Extracting { lyrics: Vec<Lyric> },
    Generating { attempt: u32 },
    Validating { attempt: u32, temperature: f32, draft: VerseDraft },
    Retry { attempt: u32 },
    Approved(Box<GenerationAttempt>),
    Exhausted,
    /// The pipeline deadline passed during `attempt`.
    OutOfTime { attempt: u32 },
}

/// Mutable state of one request.
#[derive(Default)]
struct RequestRun {
    inspiration: Vec<Lyric>,
    patterns: ExtractedPatterns,
    cost: CostSummary,
    best: Option<GenerationAttempt>,
    history: Vec<AttemptRecord>,
}

impl RequestRun {
    /// Keeps `attempt` when it has verses and beats the retained best.
    fn offer(&mut self, attempt: GenerationAttempt) {
        if !attempt.is_usable() {
            return;
        }
        let better = match &self.best {
            Some(best) => attempt.validation.score > best.validation.score,
            None => true,
        };
        if better {
            self.best = Some(attempt);
        }
    }

    /// Exit taken when no further attempt can run: the retained best if
    /// any, otherwise the provider failure that ended the run.
    fn give_up(
        mut self,
        attempts: u32,
        source: LlmError,
        started: Instant,
    ) -> Result<GenerationResult, GenerationError> {
        match self.best.take() {
            Some(best) => {
                info!(
                    score = best.validation.score,
                    "Stopping after {} attempts, returning best attempt", attempts
                );
                Ok(self.finish(best, attempts, Outcome::Exhausted, started))
            }
            None => Err(GenerationError::Provider { attempts, source }),
        }
    }

    fn finish(
        self,
        chosen: GenerationAttempt,
        attempts: u32,
        outcome: Outcome,
        started: Instant,
    ) -> GenerationResult {
        GenerationResult {
            formatted: chosen.draft.verses.join("\n"),
            verses: chosen.draft.verses,
            score: chosen.validation.score,
            attempts,
            best_attempt: chosen.attempt,
            approved: outcome == Outcome::Approved,
            outcome,
            inspiration: self.inspiration,
            patterns: self.patterns,
            validation: chosen.validation,
            cost: self.cost,
            elapsed_ms: started.elapsed().as_millis() as u64,
            history: self.history,
        }
    }
}

pub struct RhymeGenerator {
    retriever: Arc<dyn LyricRetriever>,
    extractor: PatternExtractor,
    generator: VerseGenerator,
    validator: QualityValidator,
    settings: GeneratorSettings,
}

impl RhymeGenerator {
    pub fn new(ctx: PipelineContext, settings: GeneratorSettings, pricing: Pricing) -> Self {
        Self {
            generator: VerseGenerator::new(ctx.generation, &settings, pricing),
            validator: QualityValidator::new(
                ctx.validation,
                settings.min_score,
                settings.attempt_timeout,
            ),
            retriever: ctx.retriever,
            extractor: PatternExtractor::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Sampling temperature for a 1-based attempt number.
    pub fn temperature_for(&self, attempt: u32) -> f32 {
        (self.settings.base_temperature + attempt.saturating_sub(1) as f32 * TEMPERATURE_STEP)
            .min(MAX_TEMPERATURE)
    }

    /// Runs the pipeline within the configured wall-clock ceiling. Provider
    /// calls race the remaining time; when it runs out the best attempt so
    /// far is returned unapproved.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let started = Instant::now();
        let deadline = Deadline::now() + self.settings.pipeline_timeout;
        let max_attempts = self.settings.max_attempts.max(1);
        let mut run = RequestRun::default();
        let mut state = PipelineState::Searching;

        loop {
            state = match state {
                PipelineState::Searching => {
                    let lyrics = self.retriever.search(
                        &request.theme,
                        request.style,
                        request.context.as_deref(),
                        self.settings.lyrics_to_fetch,
                    )?;
                    if lyrics.is_empty() {
                        warn!(
                            "No lyrics for theme {:?} in style {}",
                            request.theme, request.style
                        );
                        return Err(GenerationError::EmptyCorpus {
                            theme: request.theme.clone(),
                            style: request.style,
                        });
                    }
                    info!("Found {} reference lyrics", lyrics.len());
                    PipelineState::Extracting { lyrics }
                }

                PipelineState::Extracting { lyrics } => {
                    let mut patterns = self.extractor.extract(&lyrics, &request.theme);
                    if self.settings.use_corpus_rhymes {
                        let ids: Vec<i64> = lyrics.iter().map(|l| l.id).collect();
                        match self.retriever.top_rhymes(&ids, CORPUS_RHYMES_TO_MERGE) {
                            Ok(stored) => patterns.merge_rhyme_pairs(stored),
                            Err(e) => warn!("Could not load stored rhymes: {:#}", e),
                        }
                    }
                    info!(
                        rhyme_pairs = patterns.rhyme_pairs.len(),
                        keywords = patterns.keywords.len(),
                        exemplars = patterns.exemplars.len(),
                        "Extracted patterns"
                    );
                    run.inspiration = lyrics;
                    run.patterns = patterns;
                    PipelineState::Generating { attempt: 1 }
                }

                PipelineState::Generating { attempt } => {
                    let temperature = self.temperature_for(attempt);
                    info!(
                        attempt = attempt,
                        max_attempts = max_attempts,
                        temperature = temperature,
                        "Generating verses"
                    );
                    let remaining = deadline.saturating_duration_since(Deadline::now());
                    let generated = timeout(
                        self.settings.attempt_timeout.min(remaining),
                        self.generator.generate(request, &run.patterns, temperature),
                    )
                    .await
                    .unwrap_or(Err(LlmError::Timeout));

                    match generated {
                        Ok(draft) => {
                            run.cost.add(&draft);
                            PipelineState::Validating {
                                attempt,
                                temperature,
                                draft,
                            }
                        }
                        Err(e) => {
                            warn!(attempt = attempt, "Generation failed: {}", e);
                            run.history.push(AttemptRecord {
                                attempt,
                                temperature,
                                score: None,
                                cost_so_far: run.cost.total_brl,
                                error: Some(e.to_string()),
                            });
                            if Deadline::now() >= deadline {
                                PipelineState::OutOfTime { attempt }
                            } else if attempt >= max_attempts {
                                return run.give_up(attempt, e, started);
                            } else {
                                PipelineState::Retry { attempt }
                            }
                        }
                    }
                }

                PipelineState::Validating {
                    attempt,
                    temperature,
                    draft,
                } => {
                    let checked = timeout_at(
                        deadline,
                        self.validator.validate(&draft.verses, request, &run.patterns),
                    )
                    .await;
                    match checked {
                        Ok(validation) => {
                            info!(
                                attempt = attempt,
                                score = validation.score,
                                approved = validation.approved,
                                cost = run.cost.total_brl,
                                "Validated attempt"
                            );
                            run.history.push(AttemptRecord {
                                attempt,
                                temperature,
                                score: Some(validation.score),
                                cost_so_far: run.cost.total_brl,
                                error: None,
                            });

                            let current = GenerationAttempt {
                                attempt,
                                temperature,
                                draft,
                                validation,
                            };
                            if current.validation.approved {
                                PipelineState::Approved(Box::new(current))
                            } else {
                                run.offer(current);
                                if attempt >= max_attempts {
                                    PipelineState::Exhausted
                                } else {
                                    PipelineState::Retry { attempt }
                                }
                            }
                        }
                        Err(_) => {
                            run.history.push(AttemptRecord {
                                attempt,
                                temperature,
                                score: None,
                                cost_so_far: run.cost.total_brl,
                                error: Some("validation cut short by pipeline deadline".to_string()),
                            });
                            PipelineState::OutOfTime { attempt }
                        }
                    }
                }

                PipelineState::Retry { attempt } => PipelineState::Generating {
                    attempt: attempt + 1,
                },

                PipelineState::Approved(current) => {
                    let attempts = current.attempt;
                    info!(
                        score = current.validation.score,
                        "Approved on attempt {}", attempts
                    );
                    return Ok(run.finish(*current, attempts, Outcome::Approved, started));
                }

                PipelineState::Exhausted => {
                    return match run.best.take() {
                        Some(best) => {
                            info!(
                                score = best.validation.score,
                                "No attempt approved, returning best of {}", max_attempts
                            );
                            Ok(run.finish(best, max_attempts, Outcome::Exhausted, started))
                        }
                        None => Err(GenerationError::TotalFailure {
                            attempts: max_attempts,
                        }),
                    };
                }

                PipelineState::OutOfTime { attempt } => {
                    warn!(
                        "Pipeline exceeded {:?} for theme {:?} during attempt {}",
                        self.settings.pipeline_timeout, request.theme, attempt
                    );
                    return run.give_up(attempt, LlmError::Timeout, started);
                }
            };
        }
    }

    /// Lyrics for a theme without context, for exploration.
    pub fn inspiration(
        &self,
        theme: &str,
        style: StyleTag,
        limit: usize,
    ) -> Result<Vec<Lyric>, GenerationError> {
        Ok(self.retriever.inspiration(theme, style, limit)?)
    }

    pub fn analyze(&self, lyrics: &[Lyric], theme: &str) -> ExtractedPatterns {
        self.extractor.extract(lyrics, theme)
    }

    /// Cost preview of the first attempt, from the prompt size alone.
    pub fn estimate_cost(&self, request: &GenerationRequest, patterns: &ExtractedPatterns) -> f64 {
        let prompt = generation_prompt(
            &request.theme,
            request.style,
            patterns,
            request.context.as_deref(),
        );
        self.generator.estimate_cost(prompt.chars().count())
    }

    pub fn stats(&self) -> Result<CorpusStats, GenerationError> {
        Ok(self.retriever.stats()?)
    }

    pub async fn service_status(&self) -> Result<ServiceStatus, GenerationError> {
        let stats = self.stats()?;
        let validator_reachable = match self.validator.provider() {
            Some(provider) => match provider.health_check().await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Validation provider {} unreachable: {}", provider.name(), e);
                    false
                }
            },
            None => false,
        };
        Ok(ServiceStatus {
            corpus_ready: stats.lyrics > 0,
            full_text: stats.full_text,
            validator_reachable,
        })
    }
}
