//! SQL behind the two retrieval strategies and the rhyme lookup.
//!
//! The full-text path ranks with FTS5's `bm25()`, which is negative with
//! more negative meaning more relevant; rows are ordered by it ascending
//! and its absolute value is exposed as `Lyric::rank`.

use super::query::match_expression;
use super::style::{StyleTag, FALLBACK_CATEGORY};
use crate::corpus::{rhyme_from_row, Lyric, RhymePair};
use crate::sqlite_persistence::like_contains;
use anyhow::Result;
use rusqlite::{Connection, Row, ToSql};

/// Lyrics below this curation quality are never returned.
pub const MIN_LYRIC_QUALITY: f64 = 0.3;
/// Stored rhyme pairs below this score are never returned.
pub const MIN_RHYME_SCORE: f64 = 0.6;

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

fn parse_themes(raw: Option<String>) -> Vec<String> {
    raw.and_then(|json| serde_json::from_str::<Vec<String>>(&json).ok())
        .unwrap_or_default()
}

fn lyric_from_row(row: &Row, rank: f64) -> rusqlite::Result<Lyric> {
    Ok(Lyric {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        body: row.get(3)?,
        style: row
            .get::<_, Option<String>>(4)?
            .unwrap_or_else(|| FALLBACK_CATEGORY.to_string()),
        quality: row.get(5)?,
        themes: parse_themes(row.get(6)?),
        rank,
    })
}

fn style_params(style: StyleTag) -> Vec<Box<dyn ToSql>> {
    style
        .corpus_categories()
        .iter()
        .map(|c| Box::new(c.to_string()) as Box<dyn ToSql>)
        .collect()
}

fn run_query(
    conn: &Connection,
    sql: &str,
    params: Vec<Box<dyn ToSql>>,
    ranked: bool,
) -> Result<Vec<Lyric>> {
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), |row| {
        let rank = if ranked {
            row.get::<_, f64>(7)?.abs()
        } else {
            0.0
        };
        lyric_from_row(row, rank)
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Ranked FTS5 match over title, body, themes and style.
pub fn full_text_search(
    conn: &Connection,
    terms: &[String],
    style: StyleTag,
    limit: usize,
) -> Result<Vec<Lyric>> {
    let categories = style.corpus_categories();
    let sql = format!(
        r#"SELECT l.id, l.title, a.name, l.body, l.style, COALESCE(l.quality, 0.5),
                  l.themes, bm25(lyrics_fts) AS score
           FROM lyrics_fts
           JOIN lyrics l ON lyrics_fts.rowid = l.id
           LEFT JOIN artists a ON l.artist_id = a.id
           WHERE lyrics_fts MATCH ?
           AND COALESCE(l.style, '{fallback}') IN ({styles})
           AND COALESCE(l.quality, 0.5) >= ?
           ORDER BY score
           LIMIT ?"#,
        fallback = FALLBACK_CATEGORY,
        styles = placeholders(categories.len()),
    );

    let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(match_expression(terms))];
    params.extend(style_params(style));
    params.push(Box::new(MIN_LYRIC_QUALITY));
    params.push(Box::new(limit as i64));

    run_query(conn, &sql, params, true)
}

/// Case-insensitive substring match on the lyric body, best quality first.
pub fn substring_search(
    conn: &Connection,
    terms: &[String],
    style: StyleTag,
    limit: usize,
) -> Result<Vec<Lyric>> {
    let categories = style.corpus_categories();
    let body_conditions = vec![r"LOWER(l.body) LIKE ? ESCAPE '\'"; terms.len()].join(" OR ");
    let sql = format!(
        r#"SELECT l.id, l.title, a.name, l.body, l.style, COALESCE(l.quality, 0.5), l.themes
           FROM lyrics l
           LEFT JOIN artists a ON l.artist_id = a.id
           WHERE ({body_conditions})
           AND COALESCE(l.style, '{fallback}') IN ({styles})
           AND COALESCE(l.quality, 0.5) >= ?
           ORDER BY COALESCE(l.quality, 0.5) DESC, l.id
           LIMIT ?"#,
        fallback = FALLBACK_CATEGORY,
        styles = placeholders(categories.len()),
    );

    let mut params: Vec<Box<dyn ToSql>> = terms
        .iter()
        .map(|t| Box::new(like_contains(t)) as Box<dyn ToSql>)
        .collect();
    params.extend(style_params(style));
    params.push(Box::new(MIN_LYRIC_QUALITY));
    params.push(Box::new(limit as i64));

    run_query(conn, &sql, params, false)
}

/// Best stored rhyme pairs of the given lyrics.
pub fn top_rhymes(conn: &Connection, lyric_ids: &[i64], limit: usize) -> Result<Vec<RhymePair>> {
    if lyric_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        r#"SELECT word1, word2, COALESCE(line1, ''), COALESCE(line2, ''), kind, score
           FROM rhymes
           WHERE lyric_id IN ({})
           AND score >= ?
           AND word1 != word2
           ORDER BY score DESC, id
           LIMIT ?"#,
        placeholders(lyric_ids.len())
    );

    let mut params: Vec<Box<dyn ToSql>> = lyric_ids
        .iter()
        .map(|id| Box::new(*id) as Box<dyn ToSql>)
        .collect();
    params.push(Box::new(MIN_RHYME_SCORE));
    params.push(Box::new(limit as i64));
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(param_refs.as_slice(), |r| {
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{CORPUS_VERSIONED_SCHEMAS, FULL_TEXT_SETUP_SQL};

    fn corpus() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        CORPUS_VERSIONED_SCHEMAS[0].create(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO artists (id, name) VALUES (1, 'MC Raiz');
            INSERT INTO lyrics (id, artist_id, title, body, style, quality, themes) VALUES
                (1, 1, 'Luta', 'a luta luta luta continua na quebrada', 'consciente', 0.9, '["luta"]'),
                (2, NULL, 'Rua', 'a luta segue pela rua', 'indefinido', 0.6, NULL),
                (3, 1, 'Baile', 'hoje a luta e o baile', 'festa', 0.8, '["festa"]'),
                (4, 1, 'Fraca', 'luta sem qualidade', 'consciente', 0.1, '[]'),
                (5, 1, 'Sem estilo', 'uma luta sem categoria', NULL, NULL, 'not json');
            INSERT INTO rhymes (lyric_id, word1, word2, kind, score) VALUES
                (1, 'canção', 'nação', 'perfect', 1.0),
                (1, 'mar', 'lar', 'consonant', 0.8),
                (1, 'casa', 'cama', NULL, 0.6),
                (2, 'rua', 'lua', 'perfect', 1.0),
                (1, 'sol', 'mel', 'assonant', 0.4);
            "#,
        )
        .unwrap();
        conn
    }

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_full_text_filters_style_and_quality() {
        let conn = corpus();
        conn.execute_batch(FULL_TEXT_SETUP_SQL).unwrap();
        let found = full_text_search(&conn, &terms(&["luta"]), StyleTag::Consciente, 10).unwrap();
        let ids: Vec<i64> = found.iter().map(|l| l.id).collect();
        // 3 is "festa", 4 is below the quality floor.
        assert!(ids.contains(&1) && ids.contains(&2) && ids.contains(&5));
        assert!(!ids.contains(&3) && !ids.contains(&4));
        assert!(found.iter().all(|l| l.rank > 0.0));
        assert!(found.windows(2).all(|w| w[0].rank >= w[1].rank));
    }

    #[test]
    fn test_full_text_defaults_missing_fields() {
        let conn = corpus();
        conn.execute_batch(FULL_TEXT_SETUP_SQL).unwrap();
        let found = full_text_search(&conn, &terms(&["categoria"]), StyleTag::Trap, 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].style, FALLBACK_CATEGORY);
        assert_eq!(found[0].quality, 0.5);
        assert!(found[0].themes.is_empty());
    }

    #[test]
    fn test_full_text_errors_without_index() {
        let conn = corpus();
        assert!(full_text_search(&conn, &terms(&["luta"]), StyleTag::Consciente, 10).is_err());
    }

    #[test]
    fn test_substring_orders_by_quality() {
        let conn = corpus();
        let found = substring_search(&conn, &terms(&["luta"]), StyleTag::Consciente, 10).unwrap();
        let ids: Vec<i64> = found.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 2, 5]);
        assert!(found.iter().all(|l| l.rank == 0.0));
        assert_eq!(found[0].artist.as_deref(), Some("MC Raiz"));
        assert_eq!(found[1].artist, None);
    }

    #[test]
    fn test_substring_is_case_insensitive_and_respects_limit() {
        let conn = corpus();
        let found = substring_search(&conn, &terms(&["quebrada"]), StyleTag::Gangsta, 10).unwrap();
        assert!(found.is_empty());
        let found = substring_search(&conn, &terms(&["luta"]), StyleTag::Trap, 1).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 3);
    }

    #[test]
    fn test_top_rhymes() {
        let conn = corpus();
        let pairs = top_rhymes(&conn, &[1], 10).unwrap();
        let words: Vec<&str> = pairs.iter().map(|p| p.word1.as_str()).collect();
        assert_eq!(words, vec!["canção", "mar", "casa"]);
        assert_eq!(pairs[2].kind, crate::patterns::RhymeKind::Assonant);

        assert_eq!(top_rhymes(&conn, &[1, 2], 2).unwrap().len(), 2);
        assert!(top_rhymes(&conn, &[], 10).unwrap().is_empty());
    }
}
