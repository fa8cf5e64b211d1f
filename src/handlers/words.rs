use std::collections::HashSet;

use actix_web::{post, put, web, HttpResponse};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};
use crate::models::{AppState, ProblemWord, UserUpdate};

#[derive(Deserialize)]
pub struct WordFrequencyRequest {
    #[serde(default)]
    pub word: String,
}

#[derive(Serialize)]
pub struct WordFrequencyResponse {
    pub frequency: f64,
}

/// Corpus frequency lookup, used by the client when a word is added to the
/// problem list. Unknown words report 0.
#[post("/api/word-frequency")]
pub async fn word_frequency(
    data: web::Data<AppState>,
    body: web::Json<WordFrequencyRequest>,
) -> Result<HttpResponse> {
    let word = body.word.trim();
    if word.is_empty() {
        return Err(ServiceError::Validation("word is required".to_string()));
    }

    let frequency = data.dictionary.frequency_of(word).unwrap_or(0.0);
    Ok(HttpResponse::Ok().json(WordFrequencyResponse { frequency }))
}

#[derive(Deserialize)]
pub struct ProblemWordsRequest {
    pub words: Vec<String>,
}

/// Replace a user's problem-word list. Entries are deduplicated
/// case-insensitively (first spelling wins) and their frequency is looked up
/// at add time.
#[put("/api/users/{id}/problem-words")]
pub async fn update_problem_words(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ProblemWordsRequest>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();

    let mut seen = HashSet::new();
    let mut problem_words = Vec::new();
    for word in &body.words {
        let word = word.trim();
        if word.is_empty() || !seen.insert(word.to_lowercase()) {
            continue;
        }
        problem_words.push(ProblemWord {
            word: word.to_string(),
            frequency: data.dictionary.frequency_of(word).unwrap_or(0.0),
        });
    }

    info!(
        "Updating problem words for {}: {} entries",
        user_id,
        problem_words.len()
    );

    let user = data
        .store
        .merge(
            &user_id,
            UserUpdate {
                problem_words: Some(problem_words),
                ..Default::default()
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(user.problem_words))
}
