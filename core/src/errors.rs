use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdviceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Failed to load configuration from {path}: {error}")]
    LoadFailed {
        path: String,
        #[source]
        error: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Failures of the outbound chat-completion call.
///
/// Every variant ends up as the same 500 response; the split exists so the
/// logs say which of them happened.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("OPENAI_API_KEY is not configured")]
    MissingApiKey,

    #[error("Failed to reach completion API: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Completion API rejected credentials (HTTP {status}): {body}")]
    Authentication { status: u16, body: String },

    #[error("Completion API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed completion response: {reason}")]
    MalformedResponse { reason: String },
}

pub type Result<T> = std::result::Result<T, AdviceError>;

impl UpstreamError {
    /// Stable label used as the `kind` field in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::MissingApiKey => "missing_api_key",
            UpstreamError::Network(_) => "network",
            UpstreamError::Authentication { .. } => "authentication",
            UpstreamError::Status { .. } => "status",
            UpstreamError::MalformedResponse { .. } => "malformed_response",
        }
    }

    /// Whether the failure comes from this deployment's configuration
    /// rather than from the completion service itself.
    pub fn is_configuration_issue(&self) -> bool {
        matches!(
            self,
            UpstreamError::MissingApiKey | UpstreamError::Authentication { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_kinds_are_distinct() {
        let errors = [
            UpstreamError::MissingApiKey,
            UpstreamError::Authentication {
                status: 401,
                body: String::new(),
            },
            UpstreamError::Status {
                status: 502,
                body: String::new(),
            },
            UpstreamError::MalformedResponse {
                reason: "no choices".to_string(),
            },
        ];

        let mut kinds: Vec<&str> = errors.iter().map(UpstreamError::kind).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_configuration_issues() {
        assert!(UpstreamError::MissingApiKey.is_configuration_issue());
        assert!(
            UpstreamError::Authentication {
                status: 403,
                body: "forbidden".to_string()
            }
            .is_configuration_issue()
        );
        assert!(
            !UpstreamError::MalformedResponse {
                reason: "empty".to_string()
            }
            .is_configuration_issue()
        );
    }

    #[test]
    fn test_error_messages_carry_status() {
        let err = UpstreamError::Status {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "Completion API returned HTTP 429: rate limited");

        let wrapped = AdviceError::from(err);
        assert!(wrapped.to_string().starts_with("Upstream error:"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err = AdviceError::from(ConfigError::ValidationFailed {
            reason: "Model cannot be empty".to_string(),
        });
        assert!(matches!(
            err,
            AdviceError::Config(ConfigError::ValidationFailed { .. })
        ));
        assert_eq!(
            err.to_string(),
            "Configuration error: Configuration validation failed: Model cannot be empty"
        );
    }
}
