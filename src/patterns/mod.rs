//! Keyword, rhyme, exemplar and meter mining over corpus lyrics.

mod extractor;
pub mod rhyme;
mod stopwords;

pub use extractor::{mine_rhyme_pairs, ExtractedPatterns, PatternExtractor};
pub use rhyme::{classify, last_word, lines_of, syllables, tokenize, RhymeKind};
pub use stopwords::is_stopword;
