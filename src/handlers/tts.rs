use actix_web::{post, web, HttpResponse};
use log::info;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, ServiceError};
use crate::models::AppState;

#[derive(Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
}

/// Opaque text-to-speech proxy. Carries its own request timeout so a slow
/// synthesis cannot hang the caller.
#[post("/api/tts")]
pub async fn synthesize_speech(
    data: web::Data<AppState>,
    body: web::Json<TtsRequest>,
) -> Result<HttpResponse> {
    let text = body.text.trim();
    if text.is_empty() {
        return Err(ServiceError::Validation("text is required".to_string()));
    }
    let settings = &data.settings.tts;
    if text.chars().count() > settings.max_chars {
        return Err(ServiceError::Validation(format!(
            "text too long, maximum {} characters allowed",
            settings.max_chars
        )));
    }

    let api_key = settings
        .api_key
        .as_deref()
        .ok_or_else(|| ServiceError::Synthesis("TTS service is not configured".to_string()))?;

    let client = reqwest::Client::builder()
        .timeout(settings.request_timeout)
        .build()
        .map_err(|e| ServiceError::Synthesis(e.to_string()))?;

    let url = format!(
        "https://api.elevenlabs.io/v1/text-to-speech/{}",
        settings.voice_id
    );
    let response = client
        .post(&url)
        .header("Accept", "audio/mpeg")
        .header("xi-api-key", api_key)
        .json(&json!({
            "text": text,
            "model_id": "eleven_monolingual_v1",
            "voice_settings": { "stability": 0.5, "similarity_boost": 0.5 }
        }))
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                ServiceError::Synthesis("synthesis request timed out".to_string())
            } else {
                ServiceError::Synthesis(e.to_string())
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(ServiceError::Synthesis(format!(
            "synthesis API returned {}: {}",
            status, detail
        )));
    }

    let audio = response
        .bytes()
        .await
        .map_err(|e| ServiceError::Synthesis(e.to_string()))?;
    info!("Synthesized {} bytes of audio", audio.len());

    Ok(HttpResponse::Ok()
        .content_type("audio/mpeg")
        .insert_header(("Cache-Control", "no-cache"))
        .body(audio))
}
