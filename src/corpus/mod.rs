//! Lyric corpus storage.

mod models;
mod schema;
mod store;

pub use models::{CorpusStats, DetailedStats, Lyric, NewLyric, RhymePair, UNKNOWN_ARTIST};
pub use schema::{CORPUS_VERSIONED_SCHEMAS, FULL_TEXT_SETUP_SQL, FULL_TEXT_TABLE};
pub(crate) use store::rhyme_from_row;
pub use store::{SqliteCorpusStore, DEFAULT_READ_POOL_SIZE};
