//! SQLite-backed lyric corpus.
//!
//! Reads go through a small pool of read-only connections handed out
//! round-robin, so concurrent requests can query the corpus in parallel.
//! Imports and index maintenance use the single write connection.

use super::models::{CorpusStats, DetailedStats, NewLyric, RhymePair};
use super::schema::{CORPUS_VERSIONED_SCHEMAS, FULL_TEXT_SETUP_SQL, FULL_TEXT_TABLE};
use crate::patterns::{lines_of, mine_rhyme_pairs, RhymeKind};
use crate::sqlite_persistence::{create_or_migrate, like_contains};
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

pub const DEFAULT_READ_POOL_SIZE: usize = 2;

#[derive(Clone)]
pub struct SqliteCorpusStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| anyhow!("corpus connection mutex poisoned"))
}

fn count(conn: &Connection, table: &str) -> Result<usize> {
    let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
    Ok(n as usize)
}

impl SqliteCorpusStore {
    /// Opens (creating if needed) the corpus database at `db_path`.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    /// * `read_pool_size` - Number of read-only connections (at least 1)
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open corpus database {:?}", db_path))?;

        create_or_migrate(&mut write_conn, CORPUS_VERSIONED_SCHEMAS, "corpus")?;
        write_conn.pragma_update(None, "journal_mode", "WAL")?;
        write_conn.pragma_update(None, "foreign_keys", "ON")?;

        info!(
            "Opened corpus: {} lyrics, {} rhymes, {} artists",
            count(&write_conn, "lyrics")?,
            count(&write_conn, "rhymes")?,
            count(&write_conn, "artists")?
        );

        let pool_size = read_pool_size.max(1);
        let mut read_pool = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let read_conn = Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteCorpusStore {
            read_pool,
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    /// Runs `f` on a pooled read-only connection.
    pub fn with_read_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.get_read_conn();
        let guard = lock(&conn)?;
        f(&guard)
    }

    pub fn full_text_available(&self) -> Result<bool> {
        self.with_read_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1",
                    params![FULL_TEXT_TABLE],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn stats(&self) -> Result<CorpusStats> {
        let full_text = self.full_text_available()?;
        self.with_read_conn(|conn| {
            Ok(CorpusStats {
                lyrics: count(conn, "lyrics")?,
                rhymes: count(conn, "rhymes")?,
                artists: count(conn, "artists")?,
                full_text,
            })
        })
    }

    pub fn detailed_stats(&self) -> Result<DetailedStats> {
        let totals = self.stats()?;
        self.with_read_conn(|conn| {
            let average_quality: Option<f64> =
                conn.query_row("SELECT AVG(quality) FROM lyrics", [], |r| r.get(0))?;
            let mut stmt = conn.prepare(
                "SELECT COALESCE(style, 'indefinido') AS s, COUNT(*) AS c
                 FROM lyrics GROUP BY s ORDER BY c DESC, s",
            )?;
            let by_style = stmt
                .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)? as usize)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(DetailedStats {
                totals,
                average_quality,
                by_style,
            })
        })
    }

    /// Creates (or rebuilds) the full-text index and its sync triggers.
    /// Returns the number of lyrics covered by the index.
    pub fn setup_full_text_index(&self) -> Result<usize> {
        let conn = lock(&self.write_conn)?;
        conn.execute_batch(FULL_TEXT_SETUP_SQL)
            .context("Failed to set up the full-text index")?;
        let indexed = count(&conn, "lyrics")?;
        info!("Full-text index ready over {} lyrics", indexed);
        Ok(indexed)
    }

    /// Imports one lyric together with the rhyme pairs found in its body.
    pub fn import_lyric(&self, lyric: &NewLyric) -> Result<i64> {
        let mut conn = lock(&self.write_conn)?;
        let tx = conn.transaction()?;
        let id = Self::insert_lyric(&tx, lyric)?;
        tx.commit()?;
        Ok(id)
    }

    /// Imports a JSON array of lyrics in a single transaction.
    pub fn import_file<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read import file: {:?}", path))?;
        let lyrics: Vec<NewLyric> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse import file: {:?}", path))?;

        let mut conn = lock(&self.write_conn)?;
        let tx = conn.transaction()?;
        for lyric in &lyrics {
            Self::insert_lyric(&tx, lyric)
                .with_context(|| format!("Failed to import lyric {:?}", lyric.title))?;
        }
        tx.commit()?;
        info!("Imported {} lyrics from {:?}", lyrics.len(), path);
        Ok(lyrics.len())
    }

    fn upsert_artist(tx: &Transaction, name: &str, external_id: Option<i64>) -> Result<i64> {
        let existing: Option<i64> = match external_id {
            Some(ext) => tx
                .query_row(
                    "SELECT id FROM artists WHERE external_id = ?1",
                    params![ext],
                    |r| r.get(0),
                )
                .optional()?,
            None => tx
                .query_row(
                    "SELECT id FROM artists WHERE name = ?1 ORDER BY id LIMIT 1",
                    params![name],
                    |r| r.get(0),
                )
                .optional()?,
        };
        if let Some(id) = existing {
            return Ok(id);
        }
        tx.execute(
            "INSERT INTO artists (name, external_id) VALUES (?1, ?2)",
            params![name, external_id],
        )?;
        Ok(tx.last_insert_rowid())
    }

    fn insert_lyric(tx: &Transaction, lyric: &NewLyric) -> Result<i64> {
        let artist_id = match lyric.artist.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                Some(Self::upsert_artist(tx, name, lyric.artist_external_id)?)
            }
            _ => None,
        };
        let themes = serde_json::to_string(&lyric.themes)?;

        tx.execute(
            "INSERT INTO lyrics (external_id, artist_id, title, body, url, style, quality, themes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                lyric.external_id,
                artist_id,
                lyric.title,
                lyric.body,
                lyric.url,
                lyric.style,
                lyric.quality,
                themes
            ],
        )?;
        let lyric_id = tx.last_insert_rowid();

        let mut pairs = mine_rhyme_pairs(&lines_of(&lyric.body));
        pairs.extend(lyric.rhymes.iter().cloned());
        let mut stmt = tx.prepare_cached(
            "INSERT INTO rhymes (lyric_id, word1, word2, line1, line2, kind, score)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for pair in pairs.iter().filter(|p| p.word1 != p.word2) {
            stmt.execute(params![
                lyric_id,
                pair.word1,
                pair.word2,
                pair.line1,
                pair.line2,
                pair.kind.as_str(),
                pair.score
            ])?;
        }

        debug!(
            lyric_id = lyric_id,
            rhymes = pairs.len(),
            "Imported lyric {:?}",
            lyric.title
        );
        Ok(lyric_id)
    }

    /// Stored rhyme pairs in which either word contains `word`.
    pub fn rhymes_for_word(&self, word: &str, limit: usize) -> Result<Vec<RhymePair>> {
        let pattern = like_contains(&word.trim().to_lowercase());
        self.with_read_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT word1, word2, MAX(COALESCE(line1, '')), MAX(COALESCE(line2, '')), kind, MAX(score) AS best
                 FROM rhymes
                 WHERE word1 LIKE ?1 ESCAPE '\\' OR word2 LIKE ?1 ESCAPE '\\'
                 GROUP BY word1, word2
                 ORDER BY best DESC, word1, word2
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![pattern, limit as i64], |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, String>(3)?,
                        r.get::<_, Option<String>>(4)?,
                        r.get::<_, Option<f64>>(5)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows.into_iter().map(rhyme_from_row).collect())
        })
    }
}

pub(crate) fn rhyme_from_row(
    (word1, word2, line1, line2, kind, score): (
        String,
        String,
        String,
        String,
        Option<String>,
        Option<f64>,
    ),
) -> RhymePair {
    let score = score.unwrap_or(0.0);
    let kind = kind
        .as_deref()
        .and_then(RhymeKind::parse)
        .unwrap_or_else(|| RhymeKind::from_score(score));
    RhymePair {
        word1,
        word2,
        line1,
        line2,
        kind,
        score,
    }
}
