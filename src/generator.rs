//! External text-generation collaborator.
//!
//! The breakdown flow only needs text in, text out, so the seam is a small
//! async trait. Production uses an OpenAI-compatible chat-completions
//! endpoint over reqwest; tests substitute a scripted fake. One attempt per
//! call, no retries: a failed request surfaces immediately.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Error from the external generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generator is not configured: {0}")]
    NotConfigured(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("generator returned HTTP {0}: {1}")]
    Status(u16, String),
    #[error("generator returned no content")]
    EmptyReply,
}

/// Text-in/text-out collaborator used by the breakdown orchestrator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

/// Configuration for the chat-completions generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Base URL of an OpenAI-compatible API, without the trailing path.
    pub base_url: String,
    pub model: String,
    /// Missing key is reported at call time so the CRUD API stays usable
    /// without credentials.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Chat-completions client against an OpenAI-compatible endpoint.
pub struct ChatGenerator {
    http_client: HttpClient,
    config: GeneratorConfig,
}

impl ChatGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl TextGenerator for ChatGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            GeneratorError::NotConfigured("no API key set (see --generator-api-key)".to_string())
        })?;

        let url = format!("{}/chat/completions", self.config.base_url);
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: 0.7,
        };

        debug!(model = %self.config.model, "sending generation request");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Status(status.as_u16(), body));
        }

        let reply: ChatResponse = response.json().await?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GeneratorError::EmptyReply)
    }
}
