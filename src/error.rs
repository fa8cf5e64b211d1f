use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

/// Unified error type for the passage service.
///
/// Constraint violations (a candidate passage containing forbidden words) are
/// deliberately NOT represented here: running out of retry budget is a normal
/// outcome reported in a structured response body, not an error.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("user '{0}' not found")]
    UserNotFound(String),

    #[error("passage '{0}' not found in history")]
    PassageNotFound(String),

    #[error("text generation failed: {0}")]
    Upstream(String),

    #[error("generation deadline exceeded")]
    Timeout,

    #[error("store error: {0}")]
    Store(String),

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl actix_web::ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::UserNotFound(_) | ServiceError::PassageNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ServiceError::Upstream(_) | ServiceError::Synthesis(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Store(err.to_string())
    }
}
