use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::completion::{ChatMessage, CompletionClient, CompletionRequest};
use crate::config::{AdviceConfig, ApiKey};
use crate::errors::UpstreamError;

/// Error bodies from the API are cut to this many characters before they
/// travel into logs and response details.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<ApiKey>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &AdviceConfig) -> Result<Self, UpstreamError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.completion.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(UpstreamError::Network)?;

        Ok(Self {
            http,
            base_url: config.completion.base_url.trim_end_matches('/').to_string(),
            model: config.completion.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, UpstreamError> {
        let api_key = self.api_key.as_ref().ok_or(UpstreamError::MissingApiKey)?;

        let body = ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(model = %self.model, endpoint = %self.endpoint(), "Sending chat completion request");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(UpstreamError::Network)?;

        let status = response.status();
        let text = response.text().await.map_err(UpstreamError::Network)?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(UpstreamError::Authentication {
                status: status.as_u16(),
                body: truncate(&text),
            });
        }
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: truncate(&text),
            });
        }

        parse_completion(&text)
    }
}

/// Pulls the first choice's text out of a completion response body.
fn parse_completion(body: &str) -> Result<String, UpstreamError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| UpstreamError::MalformedResponse {
            reason: format!("invalid JSON: {}", e),
        })?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::MalformedResponse {
            reason: "response contains no choices".to_string(),
        })?;

    let content = choice
        .message
        .content
        .ok_or_else(|| UpstreamError::MalformedResponse {
            reason: "first choice has no content".to_string(),
        })?;

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(UpstreamError::MalformedResponse {
            reason: "completion is empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        body.to_string()
    } else {
        let mut cut: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        cut.push_str("...");
        cut
    }
}
