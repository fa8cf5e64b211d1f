use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufRead};

use log::{info, warn};

/// Number of top-frequency words considered "safe" by default.
pub const DEFAULT_SAFE_WORDS_COUNT: usize = 10000;

/// Static word-frequency table, loaded once at startup and shared read-only
/// for the lifetime of the process. The "safe" set is the top
/// `safe_words_count` entries by descending frequency, ties broken by source
/// order.
pub struct FrequencyDictionary {
    frequencies: HashMap<String, f64>,
    safe_words: HashSet<String>,
}

impl FrequencyDictionary {
    /// Load the two-column (word, frequency) table from a plain text file.
    ///
    /// Keys are lowercased; the first occurrence of a word wins. A load
    /// failure is fatal by design: silently treating every word as unsafe
    /// would make hide-mode generation impossible.
    pub fn load(file_path: &str, safe_words_count: usize) -> io::Result<Self> {
        let file = File::open(file_path)?;
        let reader = io::BufReader::new(file);

        let mut entries: Vec<(String, f64)> = Vec::new();
        let mut seen = HashSet::new();

        for line in reader.lines() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let (word, frequency) = match (parts.next(), parts.next()) {
                (Some(w), Some(f)) => (w.to_lowercase(), f),
                _ => continue,
            };
            let frequency: f64 = match frequency.parse() {
                Ok(f) => f,
                Err(_) => {
                    warn!("Skipping unparsable frequency line: {}", line.trim());
                    continue;
                }
            };
            if seen.insert(word.clone()) {
                entries.push((word, frequency));
            }
        }

        info!(
            "Loaded {} frequency entries from {} (safe cutoff: top {})",
            entries.len(),
            file_path,
            safe_words_count
        );

        Ok(Self::from_entries(entries, safe_words_count))
    }

    /// Build a dictionary from in-memory entries in source order.
    pub fn from_entries(entries: Vec<(String, f64)>, safe_words_count: usize) -> Self {
        let frequencies: HashMap<String, f64> = entries
            .iter()
            .map(|(w, f)| (w.to_lowercase(), *f))
            .collect();

        // Stable sort keeps source order on equal frequencies
        let mut ranked = entries;
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let safe_words: HashSet<String> = ranked
            .into_iter()
            .take(safe_words_count)
            .map(|(w, _)| w.to_lowercase())
            .collect();

        FrequencyDictionary {
            frequencies,
            safe_words,
        }
    }

    /// Corpus frequency of a word, or `None` when it is unknown.
    pub fn frequency_of(&self, word: &str) -> Option<f64> {
        self.frequencies.get(&word.to_lowercase()).copied()
    }

    /// Whether the word is frequent enough to be exempt from new-vocabulary
    /// bookkeeping.
    pub fn is_safe(&self, word: &str) -> bool {
        self.safe_words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entries(list: &[(&str, f64)]) -> Vec<(String, f64)> {
        list.iter().map(|(w, f)| (w.to_string(), *f)).collect()
    }

    #[test]
    fn test_safe_cutoff() {
        let dict =
            FrequencyDictionary::from_entries(entries(&[("the", 1000000.0), ("xylograph", 2.0)]), 1);
        assert!(dict.is_safe("the"));
        assert!(!dict.is_safe("xylograph"));
    }

    #[test]
    fn test_safe_cutoff_ties_broken_by_source_order() {
        let dict = FrequencyDictionary::from_entries(
            entries(&[("alpha", 5.0), ("beta", 5.0), ("gamma", 5.0)]),
            2,
        );
        assert!(dict.is_safe("alpha"));
        assert!(dict.is_safe("beta"));
        assert!(!dict.is_safe("gamma"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let dict = FrequencyDictionary::from_entries(entries(&[("The", 10.0)]), 1);
        assert_eq!(dict.frequency_of("THE"), Some(10.0));
        assert_eq!(dict.frequency_of("the"), Some(10.0));
        assert!(dict.is_safe("tHe"));
        assert_eq!(dict.frequency_of("missing"), None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "the 1000000").unwrap();
        writeln!(file, "of 800000").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "xylograph 2").unwrap();
        file.flush().unwrap();

        let dict = FrequencyDictionary::load(file.path().to_str().unwrap(), 2).unwrap();
        assert_eq!(dict.len(), 3);
        assert!(dict.is_safe("the"));
        assert!(dict.is_safe("of"));
        assert!(!dict.is_safe("xylograph"));
        assert_eq!(dict.frequency_of("xylograph"), Some(2.0));
    }

    #[test]
    fn test_safe_set_stable_across_reloads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alpha 5").unwrap();
        writeln!(file, "beta 5").unwrap();
        writeln!(file, "gamma 5").unwrap();
        writeln!(file, "delta 3").unwrap();
        file.flush().unwrap();
        let path = file.path().to_str().unwrap();

        // The cutoff falls inside a frequency tie; membership must still come
        // out the same on every load of the same file and count
        let first = FrequencyDictionary::load(path, 2).unwrap();
        let second = FrequencyDictionary::load(path, 2).unwrap();
        for word in ["alpha", "beta", "gamma", "delta"] {
            assert_eq!(first.is_safe(word), second.is_safe(word));
        }
        assert!(first.is_safe("alpha"));
        assert!(first.is_safe("beta"));
        assert!(!first.is_safe("gamma"));
        assert!(!first.is_safe("delta"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(FrequencyDictionary::load("/nonexistent/words.txt", 10).is_err());
    }
}
