use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{self, ConfigError};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const MODEL_ENV: &str = "OPENAI_MODEL";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
/// Optional path to a YAML config file, read by the runners.
pub const CONFIG_PATH_ENV: &str = "ADVICE_CONFIG_PATH";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_MAX_TOKENS: u32 = 200;
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Persona given to the model as the system message.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Ты психолог-помощник для людей с СДВГ.
Твоя задача: давать короткие, конкретные и добрые советы.
Используй простые техники: дыхание, движение, разбивку задач, таймеры.
Ответ должен быть 2-4 предложения, с эмпатией и пониманием.
Всегда предлагай конкретное действие, которое можно сделать прямо сейчас.";

/// Secret bearer token for the completion API. Never printed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdviceConfig {
    /// Left empty when no key is configured; the handler then answers every
    /// submission with an upstream failure instead of refusing to start.
    #[serde(default, skip_serializing)]
    pub api_key: Option<ApiKey>,
    #[serde(default)]
    pub completion: CompletionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
    pub request_timeout_secs: Option<u64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            request_timeout_secs: None,
        }
    }
}

pub fn load_config(config_path: Option<&str>) -> errors::Result<AdviceConfig> {
    let config = match config_path {
        Some(path) => AdviceConfig::from_file(path)?,
        None => AdviceConfig::from_env(),
    };
    config.validate()?;
    Ok(config)
}

impl AdviceConfig {
    /// Reads a YAML file, then lets the process environment override it.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_string(),
            error: Box::new(e),
        })?;
        let config: AdviceConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_string(),
                error: Box::new(e),
            })?;
        Ok(config.with_overrides(|name| std::env::var(name).ok()))
    }

    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies `OPENAI_*` overrides fetched through `lookup`. Blank values
    /// are treated as unset.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = get(API_KEY_ENV) {
            self.api_key = Some(ApiKey::new(key.trim()));
        }
        if let Some(model) = get(MODEL_ENV) {
            self.completion.model = model;
        }
        if let Some(base_url) = get(BASE_URL_ENV) {
            self.completion.base_url = base_url;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let completion = &self.completion;

        if completion.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "Model cannot be empty".to_string(),
            });
        }
        if !(completion.base_url.starts_with("http://")
            || completion.base_url.starts_with("https://"))
        {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "Base URL must start with http:// or https://, got '{}'",
                    completion.base_url
                ),
            });
        }
        if completion.max_tokens == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "max_tokens must be greater than zero".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&completion.temperature) {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "temperature must be within [0, 2], got {}",
                    completion.temperature
                ),
            });
        }
        if completion.system_prompt.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "System prompt cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_match_advice_settings() {
        let config = AdviceConfig::default();

        assert!(config.api_key.is_none());
        assert_eq!(config.completion.model, "gpt-4");
        assert_eq!(config.completion.max_tokens, 200);
        assert_eq!(config.completion.temperature, 0.8);
        assert!(config.completion.request_timeout_secs.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = AdviceConfig::default().with_overrides(env(&[
            (API_KEY_ENV, " sk-test "),
            (MODEL_ENV, "gpt-4o-mini"),
            (BASE_URL_ENV, "http://localhost:8080/v1"),
        ]));

        assert_eq!(config.api_key.as_ref().map(ApiKey::expose), Some("sk-test"));
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert_eq!(config.completion.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let config = AdviceConfig::default().with_overrides(env(&[(API_KEY_ENV, "   ")]));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_api_key_is_redacted() {
        let config = AdviceConfig {
            api_key: Some(ApiKey::new("sk-very-secret")),
            ..Default::default()
        };

        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("ApiKey(***)"));

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("sk-very-secret"));
    }

    #[test]
    fn test_parse_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("advice.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "completion:\n  model: gpt-4-turbo\n  max_tokens: 150\n  request_timeout_secs: 20\n"
        )
        .unwrap();

        let config = AdviceConfig::from_file(path.to_str().unwrap()).unwrap();

        assert_eq!(config.completion.model, "gpt-4-turbo");
        assert_eq!(config.completion.max_tokens, 150);
        assert_eq!(config.completion.request_timeout_secs, Some(20));
        // unspecified fields fall back to defaults
        assert_eq!(config.completion.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.completion.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = AdviceConfig::from_file("/nonexistent/advice.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/advice.yaml"));
    }

    #[test]
    fn test_load_config_validates_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("advice.yaml");
        std::fs::write(&path, "completion:\n  temperature: 3.5\n").unwrap();

        let err = load_config(path.to_str()).unwrap_err();
        assert!(matches!(
            err,
            errors::AdviceError::Config(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_load_config_reports_unparsable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("advice.yaml");
        std::fs::write(&path, "completion: [not, a, map]\n").unwrap();

        let err = load_config(path.to_str()).unwrap_err();
        assert!(matches!(
            err,
            errors::AdviceError::Config(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AdviceConfig::default();
        config.completion.temperature = 2.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed { .. })
        ));

        let mut config = AdviceConfig::default();
        config.completion.base_url = "api.openai.com".to_string();
        assert!(config.validate().is_err());

        let mut config = AdviceConfig::default();
        config.completion.max_tokens = 0;
        assert!(config.validate().is_err());

        let mut config = AdviceConfig::default();
        config.completion.model = " ".to_string();
        assert!(config.validate().is_err());
    }
}
