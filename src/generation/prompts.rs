//! Prompt texts sent to the generation and validation models.
//!
//! Prompts are in Brazilian Portuguese, the language of the verses.

use crate::patterns::ExtractedPatterns;
use crate::search::StyleTag;
use std::fmt::Write;

const MAX_PROMPT_KEYWORDS: usize = 12;
const MAX_PROMPT_RHYMES: usize = 6;
const MIN_PROMPT_RHYME_SCORE: f64 = 0.8;
const MAX_PROMPT_EXEMPLARS: usize = 2;
const DEFAULT_KEYWORDS: &str = "vida, luta, sonho";

const GENERATION_RULES: &str = "
REGRAS:
- Escreva EXATAMENTE 4 versos
- Versos 1-2 devem rimar entre si
- Versos 3-4 devem rimar entre si
- Cada verso: 8-12 sílabas
- Use rimas sugeridas como inspiração (não obrigatório)
- 70% inspirado nos exemplos, 30% original

Responda APENAS com os 4 versos, um por linha:";

pub fn system_prompt(style: StyleTag) -> &'static str {
    match style {
        StyleTag::Gangsta => {
            "Você é um letrista de rap brasileiro experiente, especialista em letras agressivas e de rua.\n\
             Crie versos autênticos que rimam perfeitamente. Nunca explique - apenas escreva os versos."
        }
        StyleTag::Consciente => {
            "Você é um letrista de rap brasileiro experiente, especialista em rap consciente e crítico.\n\
             Crie versos reflexivos que rimam perfeitamente. Nunca explique - apenas escreva os versos."
        }
        StyleTag::Trap => {
            "Você é um letrista de trap brasileiro experiente, especialista em flows modernos.\n\
             Crie versos com gírias atuais que rimam bem. Nunca explique - apenas escreva os versos."
        }
        StyleTag::BoomBap => {
            "Você é um letrista de rap brasileiro old school, especialista em técnica e flow clássico.\n\
             Crie versos técnicos com rimas multissilábicas. Nunca explique - apenas escreva os versos."
        }
        StyleTag::Poetico => {
            "Você é um poeta-letrista brasileiro, especialista em rap lírico e romântico.\n\
             Crie versos com metáforas e rimas elaboradas. Nunca explique - apenas escreva os versos."
        }
    }
}

/// User prompt for verse generation.
pub fn generation_prompt(
    theme: &str,
    style: StyleTag,
    patterns: &ExtractedPatterns,
    context: Option<&str>,
) -> String {
    let keywords = patterns
        .keywords
        .iter()
        .take(MAX_PROMPT_KEYWORDS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let rhymes = patterns
        .rhyme_pairs
        .iter()
        .filter(|p| p.score >= MIN_PROMPT_RHYME_SCORE)
        .take(MAX_PROMPT_RHYMES)
        .map(|p| format!("{}/{}", p.word1, p.word2))
        .collect::<Vec<_>>()
        .join(", ");

    // Writing to a String never fails.
    let mut prompt = String::new();
    let _ = writeln!(prompt, "TEMA: {}", theme);
    if let Some(context) = context {
        let _ = writeln!(prompt, "CONTEXTO: {}", context);
    }
    let _ = writeln!(prompt, "ESTILO: {}", style.description());
    let _ = writeln!(
        prompt,
        "\nPALAVRAS-CHAVE: {}",
        if keywords.is_empty() {
            DEFAULT_KEYWORDS
        } else {
            keywords.as_str()
        }
    );
    if !rhymes.is_empty() {
        let _ = writeln!(prompt, "RIMAS SUGERIDAS: {}", rhymes);
    }

    let exemplars: Vec<&String> = patterns.exemplars.iter().take(MAX_PROMPT_EXEMPLARS).collect();
    if !exemplars.is_empty() {
        prompt.push_str("\nEXEMPLOS DE REFERÊNCIA:\n");
        for (i, exemplar) in exemplars.iter().enumerate() {
            let _ = writeln!(prompt, "[{}]\n{}", i + 1, exemplar);
        }
    }

    prompt.push_str(GENERATION_RULES);
    prompt
}

pub const REVIEW_SYSTEM_PROMPT: &str =
    "Você é um crítico de rap brasileiro. Responda sempre com um único objeto JSON válido.";

/// User prompt asking the validation model for coherence and originality.
pub fn review_prompt(verses: &[String], theme: &str, style: StyleTag) -> String {
    format!(
        "Avalie estes versos de rap brasileiro em uma escala de 0 a 10.\n\n\
         TEMA SOLICITADO: {theme}\n\
         ESTILO: {style}\n\n\
         VERSOS:\n{verses}\n\n\
         Avalie considerando:\n\
         1. Coerência com o tema (0-10)\n\
         2. Originalidade/criatividade (0-10)\n\n\
         Responda APENAS em formato JSON válido:\n\
         {{\"coerencia\": 8, \"originalidade\": 7, \"feedback\": \"explicação curta\"}}",
        theme = theme,
        style = style,
        verses = verses.join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::RhymePair;
    use crate::patterns::RhymeKind;

    fn pair(word1: &str, word2: &str, kind: RhymeKind) -> RhymePair {
        RhymePair {
            word1: word1.to_string(),
            word2: word2.to_string(),
            line1: String::new(),
            line2: String::new(),
            kind,
            score: kind.score(),
        }
    }

    #[test]
    fn test_prompt_with_patterns() {
        let patterns = ExtractedPatterns {
            theme: "luta".to_string(),
            keywords: (0..20).map(|i| format!("palavra{}", i)).collect(),
            rhyme_pairs: vec![
                pair("canção", "nação", RhymeKind::Perfect),
                pair("casa", "cama", RhymeKind::Assonant),
            ],
            exemplars: vec!["a\nb\nc\nd".to_string(), "e\nf\ng\nh".to_string(), "x".to_string()],
            ..Default::default()
        };
        let prompt = generation_prompt("luta", StyleTag::Consciente, &patterns, Some("na quebrada"));

        assert!(prompt.starts_with("TEMA: luta\nCONTEXTO: na quebrada\n"));
        assert!(prompt.contains(StyleTag::Consciente.description()));
        assert!(prompt.contains("palavra11"));
        assert!(!prompt.contains("palavra12"));
        assert!(prompt.contains("RIMAS SUGERIDAS: canção/nação\n"));
        assert!(prompt.contains("[2]\ne\nf"));
        assert!(!prompt.contains("[3]"));
        assert!(prompt.ends_with("um por linha:"));
    }

    #[test]
    fn test_prompt_without_patterns_uses_defaults() {
        let prompt = generation_prompt("luta", StyleTag::Trap, &ExtractedPatterns::default(), None);
        assert!(!prompt.contains("CONTEXTO"));
        assert!(prompt.contains("PALAVRAS-CHAVE: vida, luta, sonho"));
        assert!(!prompt.contains("RIMAS SUGERIDAS"));
        assert!(!prompt.contains("EXEMPLOS"));
    }

    #[test]
    fn test_every_style_has_a_system_prompt() {
        for style in StyleTag::ALL {
            assert!(system_prompt(style).contains("apenas escreva os versos"));
        }
    }

    #[test]
    fn test_review_prompt_lists_verses() {
        let verses = vec!["um verso".to_string(), "outro verso".to_string()];
        let prompt = review_prompt(&verses, "luta", StyleTag::BoomBap);
        assert!(prompt.contains("ESTILO: boom_bap"));
        assert!(prompt.contains("um verso\noutro verso"));
        assert!(prompt.contains("\"coerencia\""));
    }
}
