//! Verse generation through the generation provider.

use super::prompts::{generation_prompt, system_prompt};
use super::types::{GenerationRequest, VerseDraft};
use crate::config::{GeneratorSettings, Pricing};
use crate::llm::{CompletionOptions, LlmError, LlmProvider, Message};
use crate::patterns::ExtractedPatterns;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const VERSES_PER_DRAFT: usize = 4;
const MIN_VERSE_CHARS: usize = 6;
const CHARS_PER_TOKEN: usize = 4;
const ESTIMATED_OUTPUT_TOKENS: u32 = 100;

lazy_static! {
    static ref NUMBERED_LINE: Regex = Regex::new(r"^\[?\d+[\].:]").unwrap();
    static ref VERSE_LABEL: Regex = Regex::new(r"(?i)^verso\s").unwrap();
    static ref EMPHASIS: Regex = Regex::new(r"^\*+|\*+$").unwrap();
}

/// Verse lines from raw model output. Numbered lines and "Verso N" labels
/// are dropped, markdown emphasis is stripped and at most four lines are
/// kept. Never pads.
pub fn parse_verses(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| l.chars().count() >= MIN_VERSE_CHARS)
        .filter(|l| !NUMBERED_LINE.is_match(l))
        .filter(|l| !VERSE_LABEL.is_match(l))
        .map(|l| EMPHASIS.replace_all(l, "").trim().to_string())
        .filter(|l| l.chars().count() >= MIN_VERSE_CHARS)
        .take(VERSES_PER_DRAFT)
        .collect()
}

fn estimate_tokens(chars: usize) -> u32 {
    chars.div_ceil(CHARS_PER_TOKEN) as u32
}

pub struct VerseGenerator {
    provider: Arc<dyn LlmProvider>,
    pricing: Pricing,
    max_output_tokens: u32,
    presence_penalty: f32,
    frequency_penalty: f32,
    timeout: Duration,
}

impl VerseGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: &GeneratorSettings, pricing: Pricing) -> Self {
        Self {
            provider,
            pricing,
            max_output_tokens: settings.max_output_tokens,
            presence_penalty: settings.presence_penalty,
            frequency_penalty: settings.frequency_penalty,
            timeout: settings.attempt_timeout,
        }
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
        patterns: &ExtractedPatterns,
        temperature: f32,
    ) -> Result<VerseDraft, LlmError> {
        let system = system_prompt(request.style);
        let prompt = generation_prompt(
            &request.theme,
            request.style,
            patterns,
            request.context.as_deref(),
        );
        let options = CompletionOptions {
            temperature,
            max_tokens: Some(self.max_output_tokens),
            presence_penalty: Some(self.presence_penalty),
            frequency_penalty: Some(self.frequency_penalty),
            json_response: false,
            timeout: self.timeout,
        };

        let response = self
            .provider
            .complete(&[Message::system(system), Message::user(&prompt)], &options)
            .await?;

        let content = response.message.content;
        let (input_tokens, output_tokens) = match response.usage {
            Some(usage) => (usage.prompt_tokens, usage.completion_tokens),
            None => (
                estimate_tokens(system.chars().count() + prompt.chars().count()),
                estimate_tokens(content.chars().count()),
            ),
        };
        let verses = parse_verses(&content);

        debug!(
            provider = self.provider.name(),
            input_tokens = input_tokens,
            output_tokens = output_tokens,
            "Parsed {} verses",
            verses.len()
        );

        Ok(VerseDraft {
            verses,
            input_tokens,
            output_tokens,
            cost_brl: self.pricing.cost_brl(input_tokens, output_tokens),
        })
    }

    /// Cost preview for a prompt of `prompt_chars` characters.
    pub fn estimate_cost(&self, prompt_chars: usize) -> f64 {
        self.pricing
            .cost_brl(estimate_tokens(prompt_chars), ESTIMATED_OUTPUT_TOKENS)
    }
}
