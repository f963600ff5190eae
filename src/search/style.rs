//! Public generation styles and their corpus categories.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Corpus category every style accepts. Lyrics that were never classified
/// are stored under it.
pub const FALLBACK_CATEGORY: &str = "indefinido";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StyleTag {
    Gangsta,
    Consciente,
    Trap,
    #[value(name = "boom_bap")]
    BoomBap,
    Poetico,
}

impl StyleTag {
    pub const ALL: [StyleTag; 5] = [
        StyleTag::Gangsta,
        StyleTag::Consciente,
        StyleTag::Trap,
        StyleTag::BoomBap,
        StyleTag::Poetico,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleTag::Gangsta => "gangsta",
            StyleTag::Consciente => "consciente",
            StyleTag::Trap => "trap",
            StyleTag::BoomBap => "boom_bap",
            StyleTag::Poetico => "poetico",
        }
    }

    pub fn parse(s: &str) -> Option<StyleTag> {
        let s = s.trim().to_lowercase().replace('-', "_");
        StyleTag::ALL.into_iter().find(|style| style.as_str() == s)
    }

    /// Stored style values matched by this public style. The fallback
    /// category is always last.
    pub fn corpus_categories(&self) -> [&'static str; 3] {
        let [a, b] = match self {
            StyleTag::Gangsta => ["agressivo", "gangsta"],
            StyleTag::Consciente => ["consciente", "storytelling"],
            StyleTag::Trap => ["festa", "trap"],
            StyleTag::BoomBap => ["tecnico", "boom_bap"],
            StyleTag::Poetico => ["romantico", "poetico"],
        };
        [a, b, FALLBACK_CATEGORY]
    }

    pub fn description(&self) -> &'static str {
        match self {
            StyleTag::Gangsta => "agressivo, de rua, confrontacional, linguagem direta",
            StyleTag::Consciente => "reflexivo, crítico social, mensagem profunda, poético",
            StyleTag::Trap => "moderno, melódico, gírias atuais, flow trap brasileiro",
            StyleTag::BoomBap => "clássico, técnico, multissilábicas, flow old school",
            StyleTag::Poetico => "lírico, metafórico, romântico, linguagem elaborada",
        }
    }
}

impl fmt::Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
