use actix_web::{post, web, HttpResponse};
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};
use crate::models::{AppState, PassageMetadata, ProblemWord, ReadingLevel, VocabularyMode};
use crate::services::orchestrator::{self, GenerationOutcome, PassageRequest};

/// Sentinel body text returned when the retry budget runs out. The client
/// keys off this string, so it must stay stable.
pub const GENERATION_FAILURE_TEXT: &str =
    "Not able to generate a passage with the selected problem words";

fn default_temperature() -> f64 {
    0.7
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub sub_interests: Vec<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub problem_words: Vec<ProblemWord>,
    #[serde(default)]
    pub hide_problem_words: bool,
    #[serde(default)]
    pub emphasize_problem_words: bool,
    #[serde(default)]
    pub reading_level: ReadingLevel,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub text: String,
    pub success: bool,
    pub generation_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_word_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_unique_words: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_unique_word_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passage_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_persisted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problematic_words: Option<Vec<String>>,
}

/// Passage-generation entry point: validate, run the generate/classify/retry
/// pipeline under the overall deadline, then persist the vocabulary-ledger
/// update and the passage-history record.
#[post("/api/generate")]
pub async fn generate_passage(
    data: web::Data<AppState>,
    body: web::Json<GenerateRequest>,
) -> Result<HttpResponse> {
    let req = body.into_inner();

    if req.topic.trim().is_empty() {
        return Err(ServiceError::Validation("topic is required".to_string()));
    }
    if req.user_id.trim().is_empty() {
        return Err(ServiceError::Validation("userId is required".to_string()));
    }
    let mode = VocabularyMode::from_flags(req.hide_problem_words, req.emphasize_problem_words)?;
    if !(0.0..=1.0).contains(&req.temperature) {
        return Err(ServiceError::Validation(
            "temperature must be within [0, 1]".to_string(),
        ));
    }

    let user_id = req.user_id.clone();
    let user = data
        .store
        .get(&user_id)
        .await?
        .ok_or_else(|| ServiceError::UserNotFound(user_id.clone()))?;

    let request = PassageRequest {
        topic: req.topic.trim().to_string(),
        sub_interests: req.sub_interests,
        reading_level: req.reading_level,
        mode,
        problem_words: req.problem_words,
        temperature: req.temperature,
    };

    let start_time = Utc::now();
    let passage_id = format!("p{}-{}", start_time.timestamp_millis(), user_id);

    let outcome = tokio::time::timeout(
        data.settings.generation_deadline,
        orchestrator::run(
            data.llm.as_ref(),
            &data.dictionary,
            &request,
            &user.used_non_frequent_words,
            &user.unique_words_encountered,
        ),
    )
    .await
    .map_err(|_| ServiceError::Timeout)??;

    match outcome {
        GenerationOutcome::Accepted(passage) => {
            info!(
                "Generated passage {} for {} in {} attempt(s)",
                passage_id, user_id, passage.attempts
            );
            let metadata = PassageMetadata {
                passage_id: passage_id.clone(),
                new_unique_word_count: passage.new_unique_words.len(),
                generation_time_ms: passage.generation_time_ms,
                success: true,
                start_time,
                end_time: None,
                time_spent_ms: None,
                total_word_count: passage.total_word_count,
            };

            // A persistence failure must not discard the generated text; the
            // passage is still returned and the failure surfaced in the body.
            let ledger_persisted = match data
                .ledger
                .record_success(
                    &user_id,
                    &passage.new_unique_words,
                    &passage.new_non_frequent_words,
                    metadata,
                )
                .await
            {
                Ok(_) => true,
                Err(e) => {
                    error!("Ledger update failed for {}: {}", user_id, e);
                    false
                }
            };

            Ok(HttpResponse::Ok().json(GenerateResponse {
                text: passage.text,
                success: true,
                generation_time_ms: passage.generation_time_ms,
                total_word_count: Some(passage.total_word_count),
                new_unique_word_count: Some(passage.new_unique_words.len()),
                new_unique_words: Some(passage.new_unique_words),
                start_time: Some(start_time),
                passage_id: Some(passage_id),
                ledger_persisted: Some(ledger_persisted),
                problematic_words: None,
            }))
        }
        GenerationOutcome::Rejected {
            problematic_words,
            generation_time_ms,
            ..
        } => {
            let metadata = PassageMetadata {
                passage_id: passage_id.clone(),
                new_unique_word_count: 0,
                generation_time_ms,
                success: false,
                start_time,
                end_time: None,
                time_spent_ms: None,
                total_word_count: 0,
            };
            if let Err(e) = data.ledger.record_failure(&user_id, metadata).await {
                error!("Failed to record generation failure for {}: {}", user_id, e);
            }

            Ok(HttpResponse::Ok().json(GenerateResponse {
                text: GENERATION_FAILURE_TEXT.to_string(),
                success: false,
                generation_time_ms,
                total_word_count: None,
                new_unique_words: None,
                new_unique_word_count: None,
                start_time: Some(start_time),
                // The failure history entry carries this id too, so the
                // timing endpoint can close it like any other record.
                passage_id: Some(passage_id),
                ledger_persisted: None,
                problematic_words: Some(problematic_words),
            }))
        }
    }
}
