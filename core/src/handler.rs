use serde_json::Value;
use std::time::Instant;
use tracing::{Instrument, error, info, info_span, warn};

use crate::completion::openai::OpenAiClient;
use crate::completion::{ChatMessage, CompletionClient, CompletionRequest};
use crate::config::{AdviceConfig, CompletionConfig};
use crate::errors;
use crate::event::{AdviceResult, InvocationEvent, InvocationResponse, RequestMethod};

pub const SITUATION_REQUIRED: &str = "Опиши свою ситуацию";
pub const INVALID_BODY: &str = "Invalid JSON body";
pub const ADVICE_FAILED: &str = "Не удалось получить совет";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";

/// Turns one invocation event into one response.
///
/// Holds no per-request state, so a single instance serves every
/// invocation of a warm runtime. `handle` never fails: each branch,
/// upstream failures included, ends in a structured response.
pub struct AdviceHandler<C = OpenAiClient> {
    client: C,
    system_prompt: String,
    max_tokens: u32,
    temperature: f32,
}

enum BodyRejection {
    InvalidJson(serde_json::Error),
    MissingSituation,
}

impl AdviceHandler<OpenAiClient> {
    pub fn from_config(config: &AdviceConfig) -> errors::Result<Self> {
        let client = OpenAiClient::new(config)?;
        if config.api_key.is_none() {
            warn!("OPENAI_API_KEY is not set, every submission will fail upstream");
        }
        info!(model = %client.model(), endpoint = %client.endpoint(), "Advice handler ready");
        Ok(Self::new(client, &config.completion))
    }
}

impl<C: CompletionClient> AdviceHandler<C> {
    pub fn new(client: C, settings: &CompletionConfig) -> Self {
        Self {
            client,
            system_prompt: settings.system_prompt.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }

    pub async fn handle(&self, event: InvocationEvent, request_id: &str) -> InvocationResponse {
        let method = event.method();
        let span = info_span!("invocation", request_id = %request_id, method = %method.as_str());

        async move {
            match method {
                RequestMethod::Options => InvocationResponse::preflight(),
                RequestMethod::Post => {
                    if event.is_base64_encoded {
                        warn!("Body is flagged as base64, parsing it as plain text");
                    }
                    self.submit(event.body.as_deref(), request_id).await
                }
                RequestMethod::Other(_) => {
                    warn!("Rejecting unsupported method");
                    InvocationResponse::json(405, &AdviceResult::failure(METHOD_NOT_ALLOWED))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn submit(&self, body: Option<&str>, request_id: &str) -> InvocationResponse {
        let situation = match extract_situation(body) {
            Ok(situation) => situation,
            Err(BodyRejection::InvalidJson(e)) => {
                warn!(error = %e, "Request body is not valid JSON");
                return InvocationResponse::json(
                    400,
                    &AdviceResult::failure_with_details(INVALID_BODY, e.to_string()),
                );
            }
            Err(BodyRejection::MissingSituation) => {
                warn!("Request has no situation to advise on");
                return InvocationResponse::json(400, &AdviceResult::failure(SITUATION_REQUIRED));
            }
        };

        let started = Instant::now();
        match self.client.complete(&self.completion_request(situation)).await {
            Ok(advice) => {
                info!(
                    latency_ms = started.elapsed().as_millis() as u64,
                    advice_chars = advice.chars().count(),
                    "Advice generated"
                );
                InvocationResponse::json(
                    200,
                    &AdviceResult::Advice {
                        advice: advice.trim().to_string(),
                        timestamp: request_id.to_string(),
                    },
                )
            }
            Err(e) => {
                error!(
                    kind = e.kind(),
                    configuration_issue = e.is_configuration_issue(),
                    latency_ms = started.elapsed().as_millis() as u64,
                    "Completion call failed: {}",
                    e
                );
                InvocationResponse::json(
                    500,
                    &AdviceResult::failure_with_details(ADVICE_FAILED, e.to_string()),
                )
            }
        }
    }

    fn completion_request(&self, situation: String) -> CompletionRequest {
        CompletionRequest {
            messages: vec![
                ChatMessage::system(self.system_prompt.as_str()),
                ChatMessage::user(situation),
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// An absent or blank body counts as `{}`.
fn extract_situation(body: Option<&str>) -> Result<String, BodyRejection> {
    let raw = body.map(str::trim).filter(|b| !b.is_empty()).unwrap_or("{}");
    let value: Value = serde_json::from_str(raw).map_err(BodyRejection::InvalidJson)?;

    match value.get("situation").and_then(Value::as_str) {
        Some(situation) if !situation.is_empty() => Ok(situation.to_string()),
        _ => Err(BodyRejection::MissingSituation),
    }
}
