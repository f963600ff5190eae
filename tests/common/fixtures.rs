//! Temporary corpus fixtures

use super::constants::*;
use rimas_generator::corpus::{NewLyric, SqliteCorpusStore};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn lyric(title: &str, artist: &str, style: &str, quality: f64, body: &str) -> NewLyric {
    NewLyric {
        title: title.to_string(),
        artist: Some(artist.to_string()),
        body: body.to_string(),
        style: Some(style.to_string()),
        quality: Some(quality),
        themes: vec!["rua".to_string()],
        ..Default::default()
    }
}

fn fixture_lyrics() -> Vec<NewLyric> {
    vec![
        lyric(
            "Voz da Quebrada",
            ARTIST_1_NAME,
            "consciente",
            0.9,
            "Nasci na quebrada onde o sol não tem perdão\n\
             Aprendi com a vida a carregar meu coração\n\
             Cada esquina conta a história da nação\n\
             E a minha rima é a minha oração",
        ),
        lyric(
            "Caminhada",
            "Rima Firme",
            "storytelling",
            0.7,
            "A quebrada me ensinou a nunca desistir\n\
             Mesmo quando o mundo insiste em me ferir\n\
             Levanto cedo com vontade de seguir\n\
             O sonho é grande e ninguém vai me impedir",
        ),
        lyric(
            "Nota Alta",
            "Trap Dez",
            "trap",
            0.8,
            "Contando dinheiro no meio da noite\n\
             O flow é pesado parece um açoite\n\
             Corrente no peito brilhando no escuro\n\
             Eu penso no agora não penso no futuro",
        ),
        lyric(
            "Descartada",
            "Anônimo",
            "consciente",
            0.1,
            "Letra de baixa qualidade que fala da quebrada\n\
             Fica de fora de qualquer busca filtrada",
        ),
    ]
}

/// Temporary corpus, deleted when dropped.
pub struct TestCorpus {
    pub store: Arc<SqliteCorpusStore>,
    pub db_path: PathBuf,
    _dir: TempDir,
}

impl TestCorpus {
    /// Corpus with the fixture lyrics and the full-text index.
    pub fn create() -> Self {
        let corpus = Self::without_index();
        corpus
            .store
            .setup_full_text_index()
            .expect("Failed to set up full-text index");
        corpus
    }

    /// Corpus with the fixture lyrics, served by substring search.
    pub fn without_index() -> Self {
        let corpus = Self::empty();
        for lyric in fixture_lyrics() {
            corpus
                .store
                .import_lyric(&lyric)
                .expect("Failed to import fixture lyric");
        }
        corpus
    }

    pub fn empty() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = dir.path().join("rimas.db");
        let store = Arc::new(SqliteCorpusStore::new(&db_path, 2).expect("Failed to open corpus"));
        Self {
            store,
            db_path,
            _dir: dir,
        }
    }
}
