//! Lexical retrieval of lyrics for a theme and style.

mod fts5_search;
mod query;
mod retriever;
mod style;

pub use fts5_search::{MIN_LYRIC_QUALITY, MIN_RHYME_SCORE};
pub use query::{match_expression, normalize_terms};
pub use retriever::{
    LyricRetriever, SearchStrategy, SqliteLyricRetriever, DEFAULT_INSPIRATION_LIMIT,
};
pub use style::{StyleTag, FALLBACK_CATEGORY};
