use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, ServiceError};
use crate::models::AppState;
use crate::services::ledger::ClearTarget;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearRequest {
    #[serde(default)]
    pub user_id: String,
    pub target: ClearTarget,
}

/// User-initiated reset of one of the two tracked vocabulary sets. The other
/// set and the problem-word list are untouched.
#[post("/api/vocabulary/clear")]
pub async fn clear_vocabulary(
    data: web::Data<AppState>,
    body: web::Json<ClearRequest>,
) -> Result<HttpResponse> {
    if body.user_id.trim().is_empty() {
        return Err(ServiceError::Validation("userId is required".to_string()));
    }

    let user = data.ledger.clear(&body.user_id, body.target).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "uniqueWordsEncountered": user.unique_words_encountered.len(),
        "usedNonFrequentWords": user.used_non_frequent_words.len(),
    })))
}
