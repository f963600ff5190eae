//! Lyric retrieval over the corpus.

use super::fts5_search::{full_text_search, substring_search, top_rhymes};
use super::query::normalize_terms;
use super::style::StyleTag;
use crate::corpus::{CorpusStats, Lyric, RhymePair, SqliteCorpusStore};
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_INSPIRATION_LIMIT: usize = 5;

/// How a request is served. Chosen once per request from the availability
/// of the full-text index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    FullText,
    Substring,
}

pub trait LyricRetriever: Send + Sync {
    /// Lyrics matching any term of `theme` and `context`, restricted to the
    /// corpus categories of `style`, most relevant first.
    fn search(
        &self,
        theme: &str,
        style: StyleTag,
        context: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Lyric>>;

    /// Best stored rhyme pairs of the given lyrics, highest score first.
    fn top_rhymes(&self, lyric_ids: &[i64], limit: usize) -> Result<Vec<RhymePair>>;

    fn stats(&self) -> Result<CorpusStats>;

    fn inspiration(&self, theme: &str, style: StyleTag, limit: usize) -> Result<Vec<Lyric>> {
        self.search(theme, style, None, limit)
    }
}

pub struct SqliteLyricRetriever {
    store: Arc<SqliteCorpusStore>,
}

impl SqliteLyricRetriever {
    pub fn new(store: Arc<SqliteCorpusStore>) -> Self {
        Self { store }
    }

    pub fn strategy(&self) -> Result<SearchStrategy> {
        Ok(if self.store.full_text_available()? {
            SearchStrategy::FullText
        } else {
            SearchStrategy::Substring
        })
    }

    fn search_with(
        &self,
        strategy: SearchStrategy,
        terms: &[String],
        style: StyleTag,
        limit: usize,
    ) -> Result<Vec<Lyric>> {
        self.store.with_read_conn(|conn| match strategy {
            SearchStrategy::FullText => full_text_search(conn, terms, style, limit),
            SearchStrategy::Substring => substring_search(conn, terms, style, limit),
        })
    }
}

impl LyricRetriever for SqliteLyricRetriever {
    fn search(
        &self,
        theme: &str,
        style: StyleTag,
        context: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Lyric>> {
        let terms = normalize_terms(theme, context);
        if terms.is_empty() {
            debug!("No usable search terms in {:?}", theme);
            return Ok(Vec::new());
        }

        let strategy = self.strategy()?;
        let found = match self.search_with(strategy, &terms, style, limit) {
            Ok(found) => found,
            Err(e) if strategy == SearchStrategy::FullText => {
                warn!("Full-text search failed, using substring search: {:#}", e);
                self.search_with(SearchStrategy::Substring, &terms, style, limit)?
            }
            Err(e) => return Err(e),
        };

        info!(
            strategy = ?strategy,
            style = %style,
            "Found {} lyrics for {:?}",
            found.len(),
            terms
        );
        Ok(found)
    }

    fn top_rhymes(&self, lyric_ids: &[i64], limit: usize) -> Result<Vec<RhymePair>> {
        if lyric_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.store
            .with_read_conn(|conn| top_rhymes(conn, lyric_ids, limit))
    }

    fn stats(&self) -> Result<CorpusStats> {
        self.store.stats()
    }
}
