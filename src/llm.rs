use crate::config::ModelConfig;
use crate::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, error, info, warn};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("API key is not configured")] MissingApiKey,
    #[error("HTTP error: {0}")] Transport(String),
    #[error("status={status} body={body}")] Status { status: u16, body: String },
    #[error("parse error: {0}")] Decode(String),
    #[error("model returned no content")] EmptyResponse,
}

impl ModelError {
    /// Worth another attempt: the request may succeed unchanged.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Transport(_) => true,
            ModelError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// One chat-style completion: a system instruction plus a user message.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn invoke(
        &self,
        model: &str,
        system_instruction: &str,
        user_message: &str,
        temperature: f32,
    ) -> Result<String, ModelError>;
}

// Keeps error bodies and logged payloads readable.
fn preview(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...[truncated {} chars]", count - max_chars)
    }
}

/// reqwest-backed client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatClient {
    client: Client,
    config: ModelConfig,
}

impl ChatClient {
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn perform_api_call(&self, body: &ChatCompletionRequest) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        debug!("🔗 POST {} model={}", url, body.model);

        let response = self.client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        let response_text = response.text().await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!("❌ API error response ({}): {}", status, preview(&response_text, 500));
            return Err(ModelError::Status { status: status.as_u16(), body: preview(&response_text, 500) });
        }

        debug!("📥 Raw completion response: {}", preview(&response_text, 1000));

        let parsed: ChatCompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| ModelError::Decode(format!("{}: {}", e, preview(&response_text, 200))))?;

        parsed.first_content().ok_or(ModelError::EmptyResponse)
    }
}

#[async_trait]
impl ModelClient for ChatClient {
    async fn invoke(
        &self,
        model: &str,
        system_instruction: &str,
        user_message: &str,
        temperature: f32,
    ) -> Result<String, ModelError> {
        if self.config.api_key.is_empty() {
            warn!("Refusing to call {}: no API key configured", model);
            return Err(ModelError::MissingApiKey);
        }

        let body = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::system(system_instruction), ChatMessage::user(user_message)],
            temperature,
        };

        // 200ms, 400ms, 800ms ... capped at 5s
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(100)
            .max_delay(Duration::from_secs(5))
            .take(self.config.max_retries);

        let started = Instant::now();
        let (this, body) = (self, &body);
        let result = RetryIf::spawn(
            strategy,
            move || this.perform_api_call(body),
            |e: &ModelError| {
                if e.is_transient() {
                    warn!("🔄 Transient failure calling {}, retrying: {}", model, e);
                    true
                } else {
                    false
                }
            },
        )
        .await;

        match &result {
            Ok(text) => info!(
                "✅ {} responded ({} chars, temperature {}, {:?})",
                model,
                text.len(),
                temperature,
                started.elapsed()
            ),
            Err(e) => error!("❌ {} failed after {:?}: {}", model, started.elapsed(), e),
        }
        result
    }
}
