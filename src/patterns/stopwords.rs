use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    /// Portuguese function words that carry no thematic weight.
    static ref STOPWORDS: HashSet<&'static str> = [
        "para", "como", "mais", "porque", "quando", "onde", "esse", "essa",
        "isso", "aqui", "voce", "você", "todo", "toda", "tudo", "muito",
        "mesmo", "ainda", "depois", "antes", "sempre", "nunca", "nada",
        "cada", "outro", "outra", "outros", "outras", "este", "esta",
        "estes", "estas", "dele", "dela", "deles", "delas", "pelo", "pela",
        "pelos", "pelas", "numa", "numas", "umas", "uns", "uma", "com",
        "sem", "por", "entre", "sobre", "contra", "desde", "durante",
        "tanto", "tanta", "tantos", "tantas", "qual", "quais", "quem",
        "cujo", "cuja", "cujos", "cujas", "algum", "alguma", "alguns",
    ]
    .into_iter()
    .collect();
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_stopword() {
        assert!(is_stopword("porque"));
        assert!(is_stopword("você"));
        assert!(!is_stopword("quebrada"));
    }
}
