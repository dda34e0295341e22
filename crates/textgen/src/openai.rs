//! OpenAI-compatible chat completion client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TextGenConfig;
use crate::{TextGenError, TextGenerator};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat completion client for a single model.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl OpenAiClient {
    /// Build a client from configuration and an API key.
    pub fn new(config: &TextGenConfig, api_key: String) -> Result<Self, TextGenError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, TextGenError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };

        tracing::debug!(model = %self.model, "Sending chat completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(classify_status(status.as_u16(), body));
        }

        let body = response.text().await?;
        content_from_body(&body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn classify_status(status: u16, body: String) -> TextGenError {
    match status {
        401 => TextGenError::Unauthorized(body),
        429 => TextGenError::RateLimited(body),
        _ => TextGenError::Status { status, body },
    }
}

/// Pull the first choice's message text out of a completion body.
fn content_from_body(body: &str) -> Result<String, TextGenError> {
    let completion: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| TextGenError::Malformed(e.to_string()))?;

    completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| TextGenError::Malformed("no choices in response".into()))?
        .message
        .content
        .ok_or_else(|| TextGenError::Malformed("first choice has no content".into()))
}
