use std::time::Duration;

use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, ServiceError};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Abstraction over the generative text model.
///
/// One request per call; retry on constraint violations belongs to the
/// orchestrator, not here. Upstream failures (network, auth, quota) propagate
/// as `ServiceError::Upstream`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f64,
    ) -> Result<String>;
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

/// OpenAI chat-completions client. The per-call timeout lives on the reqwest
/// client so a single slow attempt cannot eat the whole pipeline deadline.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;
        Ok(OpenAiClient {
            client,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f64,
    ) -> Result<String> {
        let body = json!({
            "model": self.model,
            "temperature": temperature,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::Upstream("model call timed out".to_string())
                } else {
                    ServiceError::Upstream(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        if !status.is_success() {
            return Err(ServiceError::Upstream(format!(
                "model API returned {}: {}",
                status, text
            )));
        }

        let completion: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| ServiceError::Upstream(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ServiceError::Upstream("model returned no choices".to_string()))?;

        info!("Model returned {} characters", content.len());
        Ok(content)
    }
}
