use actix_web::{post, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, ServiceError};
use crate::models::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageTimingRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub passage_id: String,
    pub end_time: DateTime<Utc>,
}

/// Close the passage-history record opened by a generation: the second phase
/// of the two-phase timing write, keyed by the passage id the generate
/// response handed out.
#[post("/api/passage-timing")]
pub async fn record_passage_timing(
    data: web::Data<AppState>,
    body: web::Json<PassageTimingRequest>,
) -> Result<HttpResponse> {
    if body.user_id.trim().is_empty() || body.passage_id.trim().is_empty() {
        return Err(ServiceError::Validation(
            "userId and passageId are required".to_string(),
        ));
    }

    data.ledger
        .close_passage(&body.user_id, &body.passage_id, body.end_time)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
