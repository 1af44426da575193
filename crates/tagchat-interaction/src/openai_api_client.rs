//! OpenAIApiClient - Direct REST API client for OpenAI-compatible chat completions.
//!
//! Sends the whole session transcript as the `messages` array and returns
//! the content of the first choice. The credential and model are read from
//! a [`CredentialSource`] on every call, so settings edits take effect
//! without rebuilding the client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tagchat_core::chat::{ChatClient, ChatError};
use tagchat_core::config::CredentialSource;
use tagchat_core::session::{Role, Turn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Chat-completion client that talks to the OpenAI HTTP API.
#[derive(Clone)]
pub struct OpenAIApiClient {
    client: Client,
    credentials: Arc<dyn CredentialSource>,
    base_url: String,
}

impl OpenAIApiClient {
    /// Creates a client reading its credential and model from `credentials`.
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            client: Client::new(),
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Overrides the endpoint URL (for compatible gateways).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn send_request(
        &self,
        api_key: &str,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<String, ChatError> {
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| {
                ChatError::transport(
                    err.status().map(|s| s.as_u16()),
                    format!("OpenAI API request failed: {err}"),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read OpenAI error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            ChatError::transport(
                Some(status.as_u16()),
                format!("Failed to parse OpenAI response: {err}"),
            )
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl ChatClient for OpenAIApiClient {
    async fn send(&self, turns: &[Turn]) -> Result<String, ChatError> {
        let Some(api_key) = self
            .credentials
            .api_key()
            .filter(|key| !key.trim().is_empty())
        else {
            return Err(ChatError::MissingCredential);
        };

        let model = self.credentials.model();
        let request = build_request(&model, turns);

        tracing::debug!(
            "Sending {} turn(s) to {} with model {}",
            turns.len(),
            self.base_url,
            model
        );
        self.send_request(&api_key, &request).await
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: Role,
    content: &'a str,
}

fn build_request<'a>(model: &'a str, turns: &'a [Turn]) -> ChatCompletionRequest<'a> {
    ChatCompletionRequest {
        model,
        messages: turns
            .iter()
            .map(|turn| ChatMessage {
                role: turn.role,
                content: &turn.content,
            })
            .collect(),
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    r#type: Option<String>,
    code: Option<String>,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String, ChatError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ChatError::transport(None, "OpenAI API returned no content in the response"))
}

fn map_http_error(status: StatusCode, body: &str) -> ChatError {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
    let quota_code = parsed.as_ref().is_some_and(|wrapper| {
        let error = &wrapper.error;
        [error.code.as_deref(), error.r#type.as_deref()]
            .into_iter()
            .flatten()
            .any(|code| code == "insufficient_quota" || code == "rate_limit_exceeded")
    });
    let message = parsed
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|| body.to_string());

    if status == StatusCode::TOO_MANY_REQUESTS || quota_code {
        tracing::warn!("OpenAI quota exceeded ({}): {}", status, message);
        return ChatError::QuotaExceeded { message };
    }

    tracing::error!("Error interacting with OpenAI API ({}): {}", status, message);
    ChatError::transport(Some(status.as_u16()), message)
}
