//! Invocation payloads in the API-Gateway proxy shape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::error;

pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
pub const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
pub const MAX_AGE: &str = "Access-Control-Max-Age";
pub const CONTENT_TYPE: &str = "Content-Type";

/// Sent with a 500 if a body ever fails to serialize.
const FALLBACK_BODY: &str = r#"{"error":"Internal error"}"#;

/// Event passed in by the hosting platform. Fields other than the ones
/// below (headers, path, requestContext, ...) are ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationEvent {
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl InvocationEvent {
    pub fn new(method: &str, body: Option<&str>) -> Self {
        Self {
            http_method: Some(method.to_string()),
            body: body.map(str::to_string),
            is_base64_encoded: false,
        }
    }

    pub fn method(&self) -> RequestMethod {
        RequestMethod::parse(self.http_method.as_deref().unwrap_or("GET"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMethod {
    Options,
    Post,
    Other(String),
}

impl RequestMethod {
    /// Exact, case-sensitive match: `post` is not `POST`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "OPTIONS" => RequestMethod::Options,
            "POST" => RequestMethod::Post,
            other => RequestMethod::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RequestMethod::Options => "OPTIONS",
            RequestMethod::Post => "POST",
            RequestMethod::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl InvocationResponse {
    /// Empty-bodied answer to a CORS preflight.
    pub fn preflight() -> Self {
        let headers = HashMap::from([
            (ALLOW_ORIGIN.to_string(), "*".to_string()),
            (ALLOW_METHODS.to_string(), "POST, OPTIONS".to_string()),
            (ALLOW_HEADERS.to_string(), "Content-Type".to_string()),
            (MAX_AGE.to_string(), "86400".to_string()),
        ]);

        Self {
            status_code: 200,
            headers,
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    pub fn json(status_code: u16, result: &AdviceResult) -> Self {
        let headers = HashMap::from([
            (CONTENT_TYPE.to_string(), "application/json".to_string()),
            (ALLOW_ORIGIN.to_string(), "*".to_string()),
        ]);

        let (status_code, body) = match result.to_json() {
            Ok(body) => (status_code, body),
            Err(e) => {
                error!(error = %e, "Failed to serialize response body");
                (500, FALLBACK_BODY.to_string())
            }
        };

        Self {
            status_code,
            headers,
            body,
            is_base64_encoded: false,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// JSON body of every non-preflight response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AdviceResult {
    Advice {
        advice: String,
        timestamp: String,
    },
    Failure {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

impl AdviceResult {
    pub fn failure(error: impl Into<String>) -> Self {
        AdviceResult::Failure {
            error: error.into(),
            details: None,
        }
    }

    pub fn failure_with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        AdviceResult::Failure {
            error: error.into(),
            details: Some(details.into()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
