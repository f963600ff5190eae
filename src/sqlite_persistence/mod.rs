mod versioned_schema;

pub use versioned_schema::{
    create_or_migrate, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    BASE_DB_VERSION, DEFAULT_TIMESTAMP,
};

/// `LIKE` pattern matching `text` anywhere, for use with `ESCAPE '\'`.
pub fn like_contains(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::like_contains;

    #[test]
    fn test_like_contains_escapes_wildcards() {
        assert_eq!(like_contains("mar"), "%mar%");
        assert_eq!(like_contains("50%_a\\"), "%50\\%\\_a\\\\%");
    }
}
