//! Chat-completion client

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AgentError;
use crate::core::config::AgentConfig;

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for the chat-completion endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// How long to wait for the endpoint
    #[serde(skip)]
    pub timeout: Duration,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Extract the first choice's message content from a response body
pub fn parse_response(body: &str) -> Result<String, AgentError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| AgentError::MalformedResponse(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| AgentError::MalformedResponse("response has no choices".to_string()))
}

/// Something that answers chat-completion requests
pub trait ChatBackend: Send + Sync {
    /// Whether credentials are available
    fn is_configured(&self) -> bool;

    /// Send a request and return the raw content of the first choice
    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, AgentError>> + Send;
}

/// OpenAI-compatible HTTP client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            url: url.into(),
            api_key,
        }
    }

    pub fn from_config(
        http: reqwest::Client,
        config: &AgentConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        Self::new(http, config.chat_url.clone(), config.resolve_api_key(env))
    }
}

impl ChatBackend for OpenAiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, AgentError>> + Send {
        async move {
            let api_key = self.api_key.as_deref().ok_or(AgentError::MissingApiKey)?;

            tracing::debug!(
                "Sending chat request ({} messages) to {}",
                request.messages.len(),
                self.url
            );
            let response = self
                .http
                .post(&self.url)
                .bearer_auth(api_key)
                .timeout(request.timeout)
                .json(request)
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                tracing::warn!("Chat request failed with status {}", status);
                return Err(AgentError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            parse_response(&body)
        }
    }
}
