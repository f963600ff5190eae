//! Query normalisation shared by both search strategies.

use crate::patterns::tokenize;

const MIN_TERM_CHARS: usize = 3;

/// Lowercased search terms from theme and optional context, in order of
/// first appearance, without duplicates.
pub fn normalize_terms(theme: &str, context: Option<&str>) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    let text = match context {
        Some(context) => format!("{} {}", theme, context),
        None => theme.to_string(),
    };
    for token in tokenize(&text) {
        if token.chars().count() >= MIN_TERM_CHARS && !terms.contains(&token) {
            terms.push(token);
        }
    }
    terms
}

/// FTS5 MATCH expression: every term quoted, OR-joined.
pub fn match_expression(terms: &[String]) -> String {
    terms
        .iter()
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_terms_drops_short_tokens() {
        let terms = normalize_terms("A luta da favela", Some("fé e superação!"));
        assert_eq!(terms, vec!["luta", "favela", "superação"]);
    }

    #[test]
    fn test_normalize_terms_dedups() {
        assert_eq!(normalize_terms("Luta luta LUTA", None), vec!["luta"]);
    }

    #[test]
    fn test_normalize_terms_can_be_empty() {
        assert!(normalize_terms("a é o", Some("!!")).is_empty());
    }

    #[test]
    fn test_match_expression() {
        let terms = vec!["luta".to_string(), "favela".to_string()];
        assert_eq!(match_expression(&terms), "\"luta\" OR \"favela\"");
    }
}
