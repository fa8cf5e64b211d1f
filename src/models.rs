use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};
use crate::services::frequency::FrequencyDictionary;
use crate::services::ledger::VocabularyLedger;
use crate::services::llm::LlmClient;
use crate::services::store::UserStore;

/// Application state shared across all handlers
pub struct AppState {
    pub dictionary: Arc<FrequencyDictionary>,
    pub store: Arc<dyn UserStore>,
    pub ledger: VocabularyLedger,
    pub llm: Arc<dyn LlmClient>,
    pub settings: RuntimeSettings,
}

#[derive(Clone)]
pub struct RuntimeSettings {
    /// Deadline for one whole generation pipeline, all attempts included.
    pub generation_deadline: Duration,
    pub tts: TtsSettings,
}

#[derive(Clone)]
pub struct TtsSettings {
    pub api_key: Option<String>,
    pub voice_id: String,
    pub request_timeout: Duration,
    pub max_chars: usize,
}

/// A word the user finds hard to pronounce. Identity is case-insensitive;
/// the frequency is looked up once when the word is added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemWord {
    pub word: String,
    pub frequency: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    pub name: String,
    #[serde(default)]
    pub sub_interests: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleStatus {
    pub id: u32,
    pub is_unlocked: bool,
    pub is_completed: bool,
}

/// One passage-history record. Created when a passage is generated and closed
/// later by the timing endpoint, which finds it by `passage_id` rather than by
/// array position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageMetadata {
    pub passage_id: String,
    pub new_unique_word_count: usize,
    pub generation_time_ms: u64,
    pub success: bool,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_ms: Option<i64>,
    pub total_word_count: usize,
}

/// The per-user aggregate, fetched and saved as a whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub problem_words: Vec<ProblemWord>,
    #[serde(default)]
    pub interests: Vec<Interest>,
    #[serde(default)]
    pub modules_completed: Vec<ModuleStatus>,
    #[serde(default)]
    pub used_non_frequent_words: Vec<String>,
    #[serde(default)]
    pub unique_words_encountered: Vec<String>,
    #[serde(default)]
    pub passage_history: Vec<PassageMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: String, name: String, email: String, interests: Vec<Interest>) -> Self {
        let now = Utc::now();
        User {
            id,
            name,
            email,
            problem_words: Vec::new(),
            interests,
            modules_completed: Vec::new(),
            used_non_frequent_words: Vec::new(),
            unique_words_encountered: Vec::new(),
            passage_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a user document. Fields left as `None` are untouched;
/// array fields are replaced wholesale, so callers own the read-modify-write.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub problem_words: Option<Vec<ProblemWord>>,
    pub interests: Option<Vec<Interest>>,
    pub modules_completed: Option<Vec<ModuleStatus>>,
    pub used_non_frequent_words: Option<Vec<String>>,
    pub unique_words_encountered: Option<Vec<String>>,
    pub passage_history: Option<Vec<PassageMetadata>>,
}

/// Vocabulary constraint applied to a generation request.
///
/// The wire format carries two booleans for compatibility with the client;
/// they are folded into this enum at the request boundary so the illegal
/// "both set" state cannot reach the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabularyMode {
    Unconstrained,
    Hide,
    Emphasize,
}

impl VocabularyMode {
    pub fn from_flags(hide: bool, emphasize: bool) -> Result<Self> {
        match (hide, emphasize) {
            (true, true) => Err(ServiceError::Validation(
                "hideProblemWords and emphasizeProblemWords are mutually exclusive".to_string(),
            )),
            (true, false) => Ok(VocabularyMode::Hide),
            (false, true) => Ok(VocabularyMode::Emphasize),
            (false, false) => Ok(VocabularyMode::Unconstrained),
        }
    }
}

/// Target reading level for a generated passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingLevel {
    #[default]
    Casual,
    Standard,
    Academic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_flags() {
        assert_eq!(
            VocabularyMode::from_flags(false, false).unwrap(),
            VocabularyMode::Unconstrained
        );
        assert_eq!(
            VocabularyMode::from_flags(true, false).unwrap(),
            VocabularyMode::Hide
        );
        assert_eq!(
            VocabularyMode::from_flags(false, true).unwrap(),
            VocabularyMode::Emphasize
        );
        assert!(VocabularyMode::from_flags(true, true).is_err());
    }
}
