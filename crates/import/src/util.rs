/// Case- and whitespace-insensitive form used for keyword matching.
pub fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// True when any (already lowercased) keyword occurs in the folded text.
pub fn contains_any(folded: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|kw| folded.contains(kw.as_str()))
}
