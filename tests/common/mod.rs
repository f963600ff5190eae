//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{FakeLlmServer, FakeReply, TestCorpus, GOOD_VERSES};
//!
//! #[tokio::test]
//! async fn test_generate() {
//!     let corpus = TestCorpus::create();
//!     let llm = FakeLlmServer::spawn(vec![FakeReply::content(GOOD_VERSES)]).await;
//!     // build providers against llm.openai_url / llm.ollama_url
//! }
//! ```

mod constants;
mod fake_llm;
mod fixtures;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use constants::*;
#[allow(unused_imports)]
pub use fake_llm::{FakeLlmServer, FakeReply};
pub use fixtures::TestCorpus;
