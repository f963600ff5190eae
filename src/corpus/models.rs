//! Corpus data types.

use crate::patterns::RhymeKind;
use serde::{Deserialize, Serialize};

/// Artist name shown when a lyric has no artist attached.
pub const UNKNOWN_ARTIST: &str = "Desconhecido";

/// A lyric returned by a corpus search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lyric {
    pub id: i64,
    pub title: String,
    pub artist: Option<String>,
    pub body: String,
    pub style: String,
    /// Curation quality in [0, 1]. Missing values are read as 0.5.
    pub quality: f64,
    pub themes: Vec<String>,
    /// Query-time relevance. Higher is more relevant; 0 when the substring
    /// fallback produced the result.
    #[serde(default)]
    pub rank: f64,
}

impl Lyric {
    pub fn artist_or_unknown(&self) -> &str {
        self.artist.as_deref().unwrap_or(UNKNOWN_ARTIST)
    }
}

/// Two line-ending words that rhyme, with the lines they close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhymePair {
    pub word1: String,
    pub word2: String,
    pub line1: String,
    pub line2: String,
    pub kind: RhymeKind,
    pub score: f64,
}

impl RhymePair {
    /// Order-independent identity of the pair.
    pub fn key(&self) -> (String, String) {
        if self.word1 <= self.word2 {
            (self.word1.clone(), self.word2.clone())
        } else {
            (self.word2.clone(), self.word1.clone())
        }
    }
}

/// A lyric to be imported into the corpus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLyric {
    #[serde(default)]
    pub external_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub artist_external_id: Option<i64>,
    pub body: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub quality: Option<f64>,
    #[serde(default)]
    pub themes: Vec<String>,
    /// Pre-extracted pairs to store alongside the ones mined from `body`.
    #[serde(default)]
    pub rhymes: Vec<RhymePair>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub lyrics: usize,
    pub rhymes: usize,
    pub artists: usize,
    pub full_text: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailedStats {
    pub totals: CorpusStats,
    pub average_quality: Option<f64>,
    /// Lyric count per stored style, most frequent first.
    pub by_style: Vec<(String, usize)>,
}
