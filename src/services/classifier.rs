use std::collections::HashSet;

use crate::models::ProblemWord;
use crate::services::frequency::FrequencyDictionary;
use crate::utils::{distinct_tokens, find_whole_word_matches};

/// How match results affect acceptability.
///
/// Hide-mode validation uses `Strict` (any forbidden or already-used match
/// rejects the passage); vocabulary bookkeeping on an accepted passage uses
/// `ReportOnly`, which never rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Strict,
    ReportOnly,
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub acceptable: bool,
    /// Problem words and already-used words found in the text, in their
    /// original spelling. Empty when the passage is acceptable.
    pub matched_words: Vec<String>,
    /// Distinct tokens below the safe-frequency cutoff that the user has not
    /// been exposed to before.
    pub new_non_frequent_words: Vec<String>,
}

/// Which explicit problem words appear in `text` as whole words,
/// case-insensitively.
pub fn find_forbidden_matches(text: &str, problem_words: &[ProblemWord]) -> Vec<String> {
    let words: Vec<String> = problem_words.iter().map(|pw| pw.word.clone()).collect();
    find_whole_word_matches(text, &words)
}

/// Classify every distinct token of a generated passage.
///
/// Per token: an explicit problem-word match always counts as forbidden, even
/// when the word is frequent, so an accepted hide-mode passage can never
/// contain one. Safe words are otherwise exempt from all bookkeeping.
/// Already-used matches reject under `Strict` (the learner should not see the
/// same obscure word twice); remaining non-frequent tokens accumulate as
/// newly introduced vocabulary.
pub fn classify(
    text: &str,
    problem_words: &[ProblemWord],
    already_used: &[String],
    dictionary: &FrequencyDictionary,
    strictness: Strictness,
) -> Classification {
    let forbidden: HashSet<String> = problem_words
        .iter()
        .map(|pw| pw.word.to_lowercase())
        .collect();
    let used: HashSet<String> = already_used.iter().map(|w| w.to_lowercase()).collect();

    let mut matched_words = Vec::new();
    let mut new_non_frequent_words = Vec::new();

    for token in distinct_tokens(text) {
        if forbidden.contains(&token) {
            // Surface the problem word in the spelling the user entered
            if let Some(pw) = problem_words
                .iter()
                .find(|pw| pw.word.to_lowercase() == token)
            {
                matched_words.push(pw.word.clone());
            }
            continue;
        }
        if dictionary.is_safe(&token) {
            continue;
        }
        if used.contains(&token) {
            matched_words.push(token);
            continue;
        }
        new_non_frequent_words.push(token);
    }

    let acceptable = match strictness {
        Strictness::Strict => matched_words.is_empty(),
        Strictness::ReportOnly => true,
    };

    Classification {
        acceptable,
        matched_words,
        new_non_frequent_words,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(safe: &[(&str, f64)], n: usize) -> FrequencyDictionary {
        FrequencyDictionary::from_entries(
            safe.iter().map(|(w, f)| (w.to_string(), *f)).collect(),
            n,
        )
    }

    fn problem(words: &[&str]) -> Vec<ProblemWord> {
        words
            .iter()
            .map(|w| ProblemWord {
                word: w.to_string(),
                frequency: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_forbidden_word_rejects_strict() {
        let dictionary = dict(&[("the", 100.0), ("are", 90.0)], 2);
        let result = classify(
            "The rocket is loud.",
            &problem(&["rocket", "engine"]),
            &[],
            &dictionary,
            Strictness::Strict,
        );
        assert!(!result.acceptable);
        assert_eq!(result.matched_words, vec!["rocket"]);
    }

    #[test]
    fn test_whole_word_only_no_substring_rejection() {
        let dictionary = dict(&[("the", 100.0), ("are", 90.0)], 2);
        // "rockets" is not a whole-word match for "rocket"
        let result = classify(
            "The rockets are loud.",
            &problem(&["rocket"]),
            &[],
            &dictionary,
            Strictness::Strict,
        );
        assert!(result.acceptable);
        assert_eq!(result.new_non_frequent_words, vec!["rockets", "loud"]);
    }

    #[test]
    fn test_frequent_problem_word_still_rejects() {
        // A problem word in the safe set must still block the passage
        let dictionary = dict(&[("the", 100.0), ("world", 90.0)], 2);
        let result = classify(
            "The world is wide.",
            &problem(&["world"]),
            &[],
            &dictionary,
            Strictness::Strict,
        );
        assert!(!result.acceptable);
        assert_eq!(result.matched_words, vec!["world"]);
    }

    #[test]
    fn test_already_used_word_rejects_strict() {
        let dictionary = dict(&[("a", 100.0)], 1);
        let result = classify(
            "A xylograph again",
            &[],
            &["xylograph".to_string()],
            &dictionary,
            Strictness::Strict,
        );
        assert!(!result.acceptable);
        assert_eq!(result.matched_words, vec!["xylograph"]);
    }

    #[test]
    fn test_report_only_never_rejects() {
        let dictionary = dict(&[("a", 100.0)], 1);
        let result = classify(
            "A rocket and a xylograph",
            &problem(&["rocket"]),
            &["xylograph".to_string()],
            &dictionary,
            Strictness::ReportOnly,
        );
        assert!(result.acceptable);
        assert_eq!(result.matched_words, vec!["rocket", "xylograph"]);
        assert_eq!(result.new_non_frequent_words, vec!["and"]);
    }

    #[test]
    fn test_safe_words_never_recorded() {
        let dictionary = dict(&[("the", 100.0), ("quick", 50.0)], 2);
        let result = classify("The quick fox", &[], &[], &dictionary, Strictness::Strict);
        assert!(result.acceptable);
        assert_eq!(result.new_non_frequent_words, vec!["fox"]);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let dictionary = dict(&[("the", 100.0)], 1);
        let text = "The quick zephyr vexed the quick zephyr.";
        let first = classify(text, &problem(&["vexed"]), &[], &dictionary, Strictness::Strict);
        let second = classify(text, &problem(&["vexed"]), &[], &dictionary, Strictness::Strict);
        assert_eq!(first.acceptable, second.acceptable);
        assert_eq!(first.matched_words, second.matched_words);
        assert_eq!(first.new_non_frequent_words, second.new_non_frequent_words);
    }

    #[test]
    fn test_find_forbidden_matches() {
        let matches = find_forbidden_matches(
            "Rockets are amazing machines.",
            &problem(&["rocket", "machines"]),
        );
        assert_eq!(matches, vec!["machines"]);
    }
}
