//! Rhyme classification and line helpers shared by the extractor, the
//! validator and the corpus importer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Vowels considered when comparing assonance and counting syllables.
const VOWELS: &str = "aeiouáéíóúâêîôûãõ";

/// Accented letters that belong to words; any other non-ASCII char splits.
const WORD_LETTERS: &str = "áéíóúâêîôûãõç";

/// Lines shorter than this (in chars, after trimming) are not verses.
const MIN_VERSE_CHARS: usize = 6;

/// How two line-ending words rhyme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RhymeKind {
    /// Same final three letters.
    Perfect,
    /// Same final two letters.
    Consonant,
    /// Same final two vowels.
    Assonant,
}

impl RhymeKind {
    /// Quality score used when ranking extracted pairs.
    pub fn score(&self) -> f64 {
        match self {
            RhymeKind::Perfect => 1.0,
            RhymeKind::Consonant => 0.8,
            RhymeKind::Assonant => 0.6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RhymeKind::Perfect => "perfect",
            RhymeKind::Consonant => "consonant",
            RhymeKind::Assonant => "assonant",
        }
    }

    /// Parses stored kind names. Portuguese names found in older corpora
    /// ("perfeita", "consoante", "toante") are accepted too.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "perfect" | "perfeita" => Some(RhymeKind::Perfect),
            "consonant" | "consoante" => Some(RhymeKind::Consonant),
            "assonant" | "toante" => Some(RhymeKind::Assonant),
            _ => None,
        }
    }

    /// Best guess for rows that carry a score but no usable kind.
    pub fn from_score(score: f64) -> Self {
        if score >= 1.0 {
            RhymeKind::Perfect
        } else if score >= 0.8 {
            RhymeKind::Consonant
        } else {
            RhymeKind::Assonant
        }
    }
}

impl fmt::Display for RhymeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expects lowercased input.
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || WORD_LETTERS.contains(c)
}

fn is_vowel(c: char) -> bool {
    VOWELS.contains(c)
}

/// Lowercases `text` and splits it into word tokens, treating every
/// non-word character as a separator.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !is_word_char(c))
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Verse lines of a lyric body: trimmed, at least six chars long, and not a
/// section marker such as `[Refrão]` or `(2x)`.
pub fn lines_of(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| {
            line.chars().count() >= MIN_VERSE_CHARS
                && !line.starts_with('[')
                && !line.starts_with('(')
        })
        .collect()
}

/// Last word of a line, lowercased and stripped of punctuation. Words shorter
/// than two chars do not count.
pub fn last_word(line: &str) -> Option<String> {
    let last = line.split_whitespace().last()?;
    let cleaned: String = last
        .to_lowercase()
        .chars()
        .filter(|c| is_word_char(*c))
        .collect();
    if cleaned.chars().count() >= 2 {
        Some(cleaned)
    } else {
        None
    }
}

fn suffix(word: &str, n: usize) -> Option<String> {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() < n {
        return None;
    }
    Some(chars[chars.len() - n..].iter().collect())
}

fn final_vowels(word: &str) -> String {
    let vowels: Vec<char> = word.chars().filter(|c| is_vowel(*c)).collect();
    let start = vowels.len().saturating_sub(2);
    vowels[start..].iter().collect()
}

/// Classifies two words by the tiered suffix match. Identity is not checked
/// here; callers that need distinct words filter them first.
pub fn classify(word1: &str, word2: &str) -> Option<RhymeKind> {
    if let (Some(a), Some(b)) = (suffix(word1, 3), suffix(word2, 3)) {
        if a == b {
            return Some(RhymeKind::Perfect);
        }
    }
    if let (Some(a), Some(b)) = (suffix(word1, 2), suffix(word2, 2)) {
        if a == b {
            return Some(RhymeKind::Consonant);
        }
    }
    let v1 = final_vowels(&word1.to_lowercase());
    let v2 = final_vowels(&word2.to_lowercase());
    if v1.chars().count() >= 2 && v1 == v2 {
        return Some(RhymeKind::Assonant);
    }
    None
}

/// Syllable proxy: number of vowel clusters in the lowercased text.
pub fn syllables(text: &str) -> usize {
    let mut count = 0;
    let mut in_group = false;
    for c in text.to_lowercase().chars() {
        if is_vowel(c) {
            if !in_group {
                count += 1;
            }
            in_group = true;
        } else {
            in_group = false;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_perfect() {
        assert_eq!(classify("canção", "nação"), Some(RhymeKind::Perfect));
        assert_eq!(RhymeKind::Perfect.score(), 1.0);
    }

    #[test]
    fn test_classify_consonant() {
        assert_eq!(classify("cantar", "olhar"), Some(RhymeKind::Consonant));
        assert_eq!(RhymeKind::Consonant.score(), 0.8);
    }

    #[test]
    fn test_classify_assonant() {
        assert_eq!(classify("casa", "cama"), Some(RhymeKind::Assonant));
        assert_eq!(RhymeKind::Assonant.score(), 0.6);
    }

    #[test]
    fn test_classify_no_match() {
        assert_eq!(classify("sol", "mar"), None);
        assert_eq!(classify("rua", "fogo"), None);
    }

    #[test]
    fn test_last_word_strips_punctuation() {
        assert_eq!(
            last_word("Eu vim da favela, vim do chão!"),
            Some("chão".to_string())
        );
        assert_eq!(last_word("termina em a"), None);
        assert_eq!(last_word("   "), None);
    }

    #[test]
    fn test_lines_of_drops_markers_and_short_lines() {
        let body = "[Refrão]\nCorre pela quebrada\n(2x)\nok\n   A luta continua   \n";
        assert_eq!(lines_of(body), vec!["Corre pela quebrada", "A luta continua"]);
    }

    #[test]
    fn test_syllables_counts_vowel_groups() {
        assert_eq!(syllables("coração"), 3);
        assert_eq!(syllables("rua"), 1);
        assert_eq!(syllables("xyz"), 0);
        assert_eq!(syllables("A vida é luta"), 6);
    }

    #[test]
    fn test_kind_parse_accepts_portuguese_names() {
        assert_eq!(RhymeKind::parse("perfeita"), Some(RhymeKind::Perfect));
        assert_eq!(RhymeKind::parse("Consonant"), Some(RhymeKind::Consonant));
        assert_eq!(RhymeKind::parse("toante"), Some(RhymeKind::Assonant));
        assert_eq!(RhymeKind::parse("rica"), None);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Superação, na RUA!"),
            vec!["superação", "na", "rua"]
        );
        assert_eq!(
            tokenize("À vontade, pingüim señor"),
            vec!["vontade", "ping", "im", "se", "or"]
        );
        assert_eq!(last_word("mó fé no coração."), Some("coração".to_string()));
    }
}
