//! Client for the external text-generation service.
//!
//! The generation job only needs "send an instruction plus a user message,
//! get text back", so the seam is the small [`TextGenerator`] trait.
//! [`OpenAiClient`] implements it against an OpenAI-compatible
//! `/chat/completions` endpoint; tests substitute canned generators.

use std::sync::Arc;

use async_trait::async_trait;

pub mod config;
pub mod openai;

pub use config::TextGenConfig;
pub use openai::OpenAiClient;

/// Errors from the text-generation layer.
#[derive(Debug, thiserror::Error)]
pub enum TextGenError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("request to text-generation service failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API key was rejected.
    #[error("text-generation service rejected the API key: {0}")]
    Unauthorized(String),

    /// The service is throttling this key.
    #[error("text-generation service rate limit exceeded: {0}")]
    RateLimited(String),

    /// Any other non-2xx response.
    #[error("text-generation service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("malformed text-generation response: {0}")]
    Malformed(String),
}

/// A service that turns an instruction and a user message into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one completion. Implementations must not retry.
    async fn complete(&self, system: &str, user: &str) -> Result<String, TextGenError>;

    /// Model identifier, for log lines.
    fn model_name(&self) -> &str;
}

/// Build the configured generator, or `None` when no API key is set.
pub fn build_generator(config: &TextGenConfig) -> Result<Option<Arc<dyn TextGenerator>>, TextGenError> {
    let Some(api_key) = config.api_key.clone() else {
        tracing::warn!("OPENAI_API_KEY not set; document generation will fail until configured");
        return Ok(None);
    };
    let client = OpenAiClient::new(config, api_key)?;
    Ok(Some(Arc::new(client)))
}
