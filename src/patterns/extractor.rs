//! Pattern mining over retrieved lyrics.
//!
//! Everything here is a pure function of its input: the same lyrics always
//! yield the same keywords, rhyme pairs, exemplars, meter profile and
//! vocabulary, in the same order.

use super::rhyme::{classify, last_word, lines_of, syllables, tokenize};
use super::stopwords::is_stopword;
use crate::corpus::{Lyric, RhymePair};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

const MAX_KEYWORDS: usize = 30;
const MAX_RHYME_PAIRS: usize = 20;
const EXEMPLAR_SOURCE_LYRICS: usize = 5;
const MAX_EXEMPLARS: usize = 3;
const EXEMPLAR_MIN_LINE_CHARS: usize = 11;
const METER_SAMPLE_LINES: usize = 100;
const METER_MIN_SYLLABLES: usize = 5;
const METER_MAX_SYLLABLES: usize = 18;
const VOCABULARY_WORDS_PER_LYRIC: usize = 30;
const MAX_VOCABULARY: usize = 50;

/// Per-request aggregate handed to the generator and the validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPatterns {
    pub theme: String,
    /// Most frequent content words, most frequent first.
    pub keywords: Vec<String>,
    /// Best rhyme pairs, highest score first.
    pub rhyme_pairs: Vec<RhymePair>,
    /// Four-line blocks, lines joined with `\n`.
    pub exemplars: Vec<String>,
    /// Distinct syllable counts seen, ascending.
    pub meter_profile: Vec<usize>,
    pub vocabulary: Vec<String>,
}

impl ExtractedPatterns {
    /// Adds corpus pairs that are not already present, keeping the list
    /// sorted by score and capped.
    pub fn merge_rhyme_pairs(&mut self, extra: Vec<RhymePair>) {
        let mut seen: HashSet<(String, String)> =
            self.rhyme_pairs.iter().map(RhymePair::key).collect();
        for pair in extra {
            if pair.word1 == pair.word2 || !seen.insert(pair.key()) {
                continue;
            }
            self.rhyme_pairs.push(pair);
        }
        self.rhyme_pairs
            .sort_by(|a, b| b.score.total_cmp(&a.score));
        self.rhyme_pairs.truncate(MAX_RHYME_PAIRS);
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, lyrics: &[Lyric], theme: &str) -> ExtractedPatterns {
        let all_lines: Vec<&str> = lyrics.iter().flat_map(|l| lines_of(&l.body)).collect();

        let mut rhyme_pairs = mine_rhyme_pairs(&all_lines);
        rhyme_pairs.truncate(MAX_RHYME_PAIRS);

        ExtractedPatterns {
            theme: theme.to_string(),
            keywords: keywords(lyrics),
            rhyme_pairs,
            exemplars: exemplars(lyrics),
            meter_profile: meter_profile(&all_lines),
            vocabulary: vocabulary(lyrics),
        }
    }
}

/// Rhyme pairs from consecutive lines, deduplicated regardless of word order
/// and sorted by score (stable, so ties keep text order).
pub fn mine_rhyme_pairs(lines: &[&str]) -> Vec<RhymePair> {
    let mut pairs = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for window in lines.windows(2) {
        let (line1, line2) = (window[0].trim(), window[1].trim());
        let (Some(word1), Some(word2)) = (last_word(line1), last_word(line2)) else {
            continue;
        };
        if word1 == word2 {
            continue;
        }
        let key = if word1 <= word2 {
            (word1.clone(), word2.clone())
        } else {
            (word2.clone(), word1.clone())
        };
        if seen.contains(&key) {
            continue;
        }
        if let Some(kind) = classify(&word1, &word2) {
            seen.insert(key);
            pairs.push(RhymePair {
                word1,
                word2,
                line1: line1.to_string(),
                line2: line2.to_string(),
                kind,
                score: kind.score(),
            });
        }
    }

    pairs.sort_by(|a, b| b.score.total_cmp(&a.score));
    pairs
}

fn content_words(text: &str) -> impl Iterator<Item = String> {
    tokenize(text).into_iter().filter(|w| !is_stopword(w))
}

fn keywords(lyrics: &[Lyric]) -> Vec<String> {
    // (word, count) in first-seen order so the stable sort breaks ties by it.
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for lyric in lyrics {
        for word in content_words(&lyric.body).filter(|w| w.chars().count() > 3) {
            match index.get(&word) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(word.clone(), counts.len());
                    counts.push((word, 1));
                }
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(word, _)| word)
        .collect()
}

fn block_has_rhyme(block: &[&str]) -> bool {
    let rhymes = |a: &str, b: &str| match (last_word(a), last_word(b)) {
        (Some(w1), Some(w2)) => classify(&w1, &w2).is_some(),
        _ => false,
    };
    rhymes(block[0], block[1]) || (block.len() >= 4 && rhymes(block[2], block[3]))
}

fn exemplars(lyrics: &[Lyric]) -> Vec<String> {
    let mut by_quality: Vec<&Lyric> = lyrics.iter().collect();
    by_quality.sort_by(|a, b| b.quality.total_cmp(&a.quality));

    let mut found = Vec::new();
    for lyric in by_quality.into_iter().take(EXEMPLAR_SOURCE_LYRICS) {
        let lines = lines_of(&lyric.body);
        // Fixed stride of four: blocks starting at offsets 1..=3 are not considered.
        let mut start = 0;
        while start + 3 < lines.len() {
            let block: Vec<&str> = lines[start..start + 4]
                .iter()
                .copied()
                .filter(|l| l.chars().count() >= EXEMPLAR_MIN_LINE_CHARS)
                .collect();
            if block.len() == 4 && block_has_rhyme(&block) {
                found.push(block.join("\n"));
                break;
            }
            start += 4;
        }
        if found.len() >= MAX_EXEMPLARS {
            break;
        }
    }
    found
}

fn meter_profile(lines: &[&str]) -> Vec<usize> {
    lines
        .iter()
        .take(METER_SAMPLE_LINES)
        .map(|l| syllables(l))
        .filter(|n| (METER_MIN_SYLLABLES..=METER_MAX_SYLLABLES).contains(n))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn vocabulary(lyrics: &[Lyric]) -> Vec<String> {
    let mut vocabulary = Vec::new();
    let mut seen = HashSet::new();
    let mut add = |word: String| {
        if seen.insert(word.clone()) {
            vocabulary.push(word);
        }
    };

    for lyric in lyrics {
        for theme in &lyric.themes {
            if theme.chars().count() > 2 {
                add(theme.to_lowercase());
            }
        }
        content_words(&lyric.body)
            .filter(|w| {
                let len = w.chars().count();
                len > 4 && len < 15
            })
            .take(VOCABULARY_WORDS_PER_LYRIC)
            .for_each(&mut add);
    }

    vocabulary.truncate(MAX_VOCABULARY);
    vocabulary
}
