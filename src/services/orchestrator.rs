use std::collections::HashSet;
use std::time::Instant;

use log::{info, warn};

use crate::error::{Result, ServiceError};
use crate::models::{ProblemWord, ReadingLevel, VocabularyMode};
use crate::services::classifier::{classify, Strictness};
use crate::services::frequency::FrequencyDictionary;
use crate::services::llm::LlmClient;
use crate::services::prompt::{build_system_prompt, build_user_prompt, PromptInputs};
use crate::utils::{distinct_tokens, tokenize};

/// Hard cap on generation attempts: one initial attempt plus one retry.
/// The counter is explicit; a persistently violating model terminates in a
/// `Rejected` outcome, never in unbounded recursion.
pub const MAX_GENERATION_ATTEMPTS: u32 = 2;

/// A validated generation request, ready for the pipeline.
pub struct PassageRequest {
    pub topic: String,
    pub sub_interests: Vec<String>,
    pub reading_level: ReadingLevel,
    pub mode: VocabularyMode,
    pub problem_words: Vec<ProblemWord>,
    pub temperature: f64,
}

#[derive(Debug)]
pub struct AcceptedPassage {
    pub text: String,
    /// Every token occurrence, not deduplicated.
    pub total_word_count: usize,
    /// Distinct tokens the user has never encountered before, in
    /// first-occurrence order.
    pub new_unique_words: Vec<String>,
    pub new_non_frequent_words: Vec<String>,
    pub generation_time_ms: u64,
    pub attempts: u32,
}

/// Terminal result of one orchestrator run. `Rejected` is a normal outcome
/// (retry budget exhausted on constraint violations), distinct from the
/// errors a failed model call or deadline produces.
#[derive(Debug)]
pub enum GenerationOutcome {
    Accepted(AcceptedPassage),
    Rejected {
        /// The words actually matched in the last candidate, not the full
        /// problem-word list.
        problematic_words: Vec<String>,
        generation_time_ms: u64,
        attempts: u32,
    },
}

/// Run the generate/classify/retry loop to a terminal decision.
///
/// Attempts are strictly sequential and the timer spans all of them. Word
/// statistics are computed only on the final accepted text.
pub async fn run(
    llm: &dyn LlmClient,
    dictionary: &FrequencyDictionary,
    request: &PassageRequest,
    already_used: &[String],
    unique_words_encountered: &[String],
) -> Result<GenerationOutcome> {
    let started = Instant::now();

    let system_prompt = build_system_prompt(&PromptInputs {
        topic: &request.topic,
        sub_interests: &request.sub_interests,
        reading_level: request.reading_level,
        mode: request.mode,
        problem_words: &request.problem_words,
        already_used,
    });
    let user_prompt = build_user_prompt(&request.topic, &request.sub_interests);

    let mut last_matches = Vec::new();

    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        let raw = llm
            .complete(&system_prompt, &user_prompt, request.temperature)
            .await?;
        let text = raw.trim().to_string();
        if text.is_empty() || text.chars().all(|c| c.is_whitespace() || c == '*') {
            return Err(ServiceError::Upstream(
                "model returned empty or invalid text".to_string(),
            ));
        }

        let strictness = match request.mode {
            VocabularyMode::Hide => Strictness::Strict,
            _ => Strictness::ReportOnly,
        };
        let classification = classify(
            &text,
            &request.problem_words,
            already_used,
            dictionary,
            strictness,
        );

        if !classification.acceptable {
            warn!(
                "Attempt {}/{} rejected; constrained words found: {:?}",
                attempt, MAX_GENERATION_ATTEMPTS, classification.matched_words
            );
            last_matches = classification.matched_words;
            continue;
        }

        let total_word_count = tokenize(&text).len();
        let encountered: HashSet<String> = unique_words_encountered
            .iter()
            .map(|w| w.to_lowercase())
            .collect();
        let new_unique_words: Vec<String> = distinct_tokens(&text)
            .into_iter()
            .filter(|t| !encountered.contains(t))
            .collect();

        let generation_time_ms = started.elapsed().as_millis() as u64;
        info!(
            "Passage accepted on attempt {}/{}: {} words, {} new unique, {} new non-frequent, {}ms",
            attempt,
            MAX_GENERATION_ATTEMPTS,
            total_word_count,
            new_unique_words.len(),
            classification.new_non_frequent_words.len(),
            generation_time_ms
        );

        return Ok(GenerationOutcome::Accepted(AcceptedPassage {
            text,
            total_word_count,
            new_unique_words,
            new_non_frequent_words: classification.new_non_frequent_words,
            generation_time_ms,
            attempts: attempt,
        }));
    }

    let generation_time_ms = started.elapsed().as_millis() as u64;
    warn!(
        "Retry budget exhausted after {} attempts; offending words: {:?}",
        MAX_GENERATION_ATTEMPTS, last_matches
    );
    Ok(GenerationOutcome::Rejected {
        problematic_words: last_matches,
        generation_time_ms,
        attempts: MAX_GENERATION_ATTEMPTS,
    })
}
