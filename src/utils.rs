use std::collections::HashSet;

/// Extract every word token from a block of text, lowercased, in order.
///
/// A token is a maximal run of letters, digits, or underscores. Punctuation
/// and whitespace are delimiters and are discarded. Occurrences are NOT
/// deduplicated; use `distinct_tokens` for the unique set.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            for lower in ch.to_lowercase() {
                current.push(lower);
            }
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Distinct lowercase tokens in first-occurrence order.
pub fn distinct_tokens(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Find which of `candidates` appear in `text` as whole words.
///
/// Matching is case-insensitive and tokenizer-based, so a candidate embedded
/// inside a longer word ("cat" in "category") is not a match. Returned words
/// keep the spelling they had in `candidates`.
pub fn find_whole_word_matches(text: &str, candidates: &[String]) -> Vec<String> {
    let tokens: HashSet<String> = tokenize(text).into_iter().collect();
    candidates
        .iter()
        .filter(|c| tokens.contains(&c.to_lowercase()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(
            tokenize("Hello, world! Hello again."),
            vec!["hello", "world", "hello", "again"]
        );
    }

    #[test]
    fn test_tokenize_numbers_and_underscores() {
        // Numbers and underscores are word characters like any other
        assert_eq!(
            tokenize("route_66 opened in 1926"),
            vec!["route_66", "opened", "in", "1926"]
        );
    }

    #[test]
    fn test_tokenize_apostrophes_split() {
        // Apostrophes are delimiters, not word characters
        assert_eq!(tokenize("don't"), vec!["don", "t"]);
    }

    #[test]
    fn test_distinct_tokens_keeps_first_occurrence_order() {
        assert_eq!(
            distinct_tokens("the cat and the dog and the cat"),
            vec!["the", "cat", "and", "dog"]
        );
    }

    #[test]
    fn test_whole_word_match_is_not_substring_match() {
        let candidates = vec!["cat".to_string()];
        assert!(find_whole_word_matches("a category of things", &candidates).is_empty());
        assert_eq!(
            find_whole_word_matches("a cat of things", &candidates),
            vec!["cat"]
        );
    }

    #[test]
    fn test_whole_word_match_case_insensitive() {
        let candidates = vec!["Rocket".to_string()];
        // Matches regardless of case, returns the candidate's own spelling
        assert_eq!(
            find_whole_word_matches("ROCKETS? No. A single rocket.", &candidates),
            vec!["Rocket"]
        );
    }
}
