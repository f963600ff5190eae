//! SQLite schema for the lyric corpus.
//!
//! `lyrics.themes` holds a JSON array of strings. The full-text index over
//! lyrics is not part of the versioned schema: it is an external-content FTS5
//! table created on demand by `SqliteCorpusStore::setup_full_text_index`, so a
//! corpus without it is still valid and served by substring search.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("external_id", &SqlType::Integer, is_unique = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_artists_name", "name")],
};

const LYRICS_TABLE: Table = Table {
    name: "lyrics",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("external_id", &SqlType::Integer),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            foreign_key = Some(&ForeignKey {
                foreign_table: "artists",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::SetNull,
            })
        ),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("body", &SqlType::Text, non_null = true),
        sqlite_column!("url", &SqlType::Text),
        sqlite_column!("style", &SqlType::Text),
        sqlite_column!("quality", &SqlType::Real),
        sqlite_column!("themes", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_lyrics_artist", "artist_id"),
        ("idx_lyrics_style", "style"),
        ("idx_lyrics_quality", "quality"),
    ],
};

const RHYMES_TABLE: Table = Table {
    name: "rhymes",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "lyric_id",
            &SqlType::Integer,
            foreign_key = Some(&ForeignKey {
                foreign_table: "lyrics",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("word1", &SqlType::Text, non_null = true),
        sqlite_column!("word2", &SqlType::Text, non_null = true),
        sqlite_column!("line1", &SqlType::Text),
        sqlite_column!("line2", &SqlType::Text),
        sqlite_column!("kind", &SqlType::Text),
        sqlite_column!("score", &SqlType::Real),
    ],
    indices: &[
        ("idx_rhymes_lyric", "lyric_id"),
        ("idx_rhymes_score", "score"),
    ],
};

pub const CORPUS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[ARTISTS_TABLE, LYRICS_TABLE, RHYMES_TABLE],
    migration: None,
}];

pub const FULL_TEXT_TABLE: &str = "lyrics_fts";

/// External-content FTS5 index over `lyrics` plus the triggers that keep it
/// in sync. Every statement is idempotent.
pub const FULL_TEXT_SETUP_SQL: &str = r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS lyrics_fts USING fts5(
        title,
        body,
        themes,
        style,
        content='lyrics',
        content_rowid='id'
    );

    CREATE TRIGGER IF NOT EXISTS lyrics_fts_ai AFTER INSERT ON lyrics BEGIN
        INSERT INTO lyrics_fts(rowid, title, body, themes, style)
        VALUES (new.id, new.title, new.body, new.themes, new.style);
    END;

    CREATE TRIGGER IF NOT EXISTS lyrics_fts_ad AFTER DELETE ON lyrics BEGIN
        INSERT INTO lyrics_fts(lyrics_fts, rowid, title, body, themes, style)
        VALUES ('delete', old.id, old.title, old.body, old.themes, old.style);
    END;

    CREATE TRIGGER IF NOT EXISTS lyrics_fts_au AFTER UPDATE ON lyrics BEGIN
        INSERT INTO lyrics_fts(lyrics_fts, rowid, title, body, themes, style)
        VALUES ('delete', old.id, old.title, old.body, old.themes, old.style);
        INSERT INTO lyrics_fts(rowid, title, body, themes, style)
        VALUES (new.id, new.title, new.body, new.themes, new.style);
    END;

    INSERT INTO lyrics_fts(lyrics_fts) VALUES ('rebuild');
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_corpus_schema_creation() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = &CORPUS_VERSIONED_SCHEMAS[0];
        schema.create(&conn).unwrap();
        schema.validate(&conn).unwrap();
    }

    #[test]
    fn test_deleting_lyric_cascades_to_rhymes() {
        let conn = Connection::open_in_memory().unwrap();
        CORPUS_VERSIONED_SCHEMAS[0].create(&conn).unwrap();

        conn.execute(
            "INSERT INTO lyrics (id, title, body, style) VALUES (1, 'T', 'corpo', 'trap')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO rhymes (lyric_id, word1, word2, kind, score) VALUES (1, 'mar', 'lar', 'consonant', 0.8)",
            [],
        )
        .unwrap();
        conn.execute("DELETE FROM lyrics WHERE id = 1", []).unwrap();

        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM rhymes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_full_text_setup_is_idempotent_and_synced() {
        let conn = Connection::open_in_memory().unwrap();
        CORPUS_VERSIONED_SCHEMAS[0].create(&conn).unwrap();
        conn.execute(
            "INSERT INTO lyrics (title, body, style, themes) VALUES ('Luta', 'a luta continua na quebrada', 'consciente', '[\"luta\"]')",
            [],
        )
        .unwrap();

        conn.execute_batch(FULL_TEXT_SETUP_SQL).unwrap();
        conn.execute_batch(FULL_TEXT_SETUP_SQL).unwrap();

        conn.execute(
            "INSERT INTO lyrics (title, body, style) VALUES ('Festa', 'hoje tem baile na quebrada', 'festa')",
            [],
        )
        .unwrap();

        let hits: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM lyrics_fts WHERE lyrics_fts MATCH '\"quebrada\"'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(hits, 2);
    }
}
