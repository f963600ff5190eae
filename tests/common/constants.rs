//! Shared constants for integration tests
//!
//! When the fixture corpus or canned model replies change, update only
//! this file.

// ============================================================================
// Fixture Corpus
// ============================================================================

/// Lyrics imported by `TestCorpus::create()`
pub const FIXTURE_LYRICS: usize = 4;

/// Lyrics of the fixture corpus stored as "consciente" or "storytelling"
pub const CONSCIENTE_LYRICS: usize = 2;

/// Word present in both consciente lyrics and in no other
pub const CONSCIENTE_WORD: &str = "quebrada";

/// Word present only in the trap lyric
pub const TRAP_WORD: &str = "dinheiro";

/// Artist of the first consciente lyric
pub const ARTIST_1_NAME: &str = "MC Periferia";

/// Word that is not in the corpus at all
pub const MISSING_WORD: &str = "astronauta";

// ============================================================================
// Canned Model Replies
// ============================================================================

/// Four verses with perfect and consonant rhymes and in-range meter
pub const GOOD_VERSES: &str = "Eu vim de baixo com a minha canção\n\
                               Carrego no peito a voz da nação\n\
                               Cada passo na quebrada me ensinou a lutar\n\
                               Ninguém vai me parar quando eu decidir voar";

/// Review that approves `GOOD_VERSES` (aggregate 9.2)
pub const APPROVING_REVIEW: &str =
    r#"{"coerencia": 9, "originalidade": 9, "feedback": "Forte e coerente"}"#;

/// Review that rejects `GOOD_VERSES` (aggregate 5.6)
pub const REJECTING_REVIEW: &str =
    r#"{"coerencia": 3, "originalidade": 3, "feedback": "Genérico"}"#;

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the fake model server to start (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
