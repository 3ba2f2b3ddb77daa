//! Configuration management for persona-agent.
//!
//! Configuration can be set via environment variables:
//! - `OPENAI_API_KEY` - Required. API key for the completion provider.
//! - `OPENAI_BASE_URL` - Optional. OpenAI-compatible endpoint. Defaults to `https://api.openai.com/v1`.
//! - `DEFAULT_MODEL` - Optional. The model to chat with. Defaults to `gpt-4o-mini`.
//! - `MAX_ROUNDS` - Optional. Maximum tool-call rounds per chat. Defaults to `10`.
//! - `PARALLEL_TOOL_CALLS` - Optional. Run the tools of one round concurrently. Defaults to `false`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Completion request timeout. Defaults to `60`.
//! - `MAX_ATTEMPTS` - Optional. Attempts per completion request; above `1` transient failures are retried. Defaults to `1`.
//! - `PERSONA_NAME` - Required. The person the chatbot speaks for.
//! - `PERSONA_DIR` - Optional. Directory holding `summary.txt` and `linkedin.txt`. Defaults to `me`.
//! - `PUSHOVER_TOKEN` / `PUSHOVER_USER` - Optional. Push notification credentials.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `7860`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Cannot read context file {path}: {source}")]
    ContextFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pushover credentials.
#[derive(Debug, Clone)]
pub struct PushoverConfig {
    pub token: String,
    pub user: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Completion provider API key
    pub api_key: String,

    /// OpenAI-compatible base URL
    pub base_url: String,

    /// Model identifier
    pub default_model: String,

    /// Maximum tool-call rounds per chat
    pub max_rounds: usize,

    /// Dispatch the tools of one round concurrently
    pub parallel_tool_calls: bool,

    /// Completion request timeout in seconds
    pub request_timeout_secs: u64,

    /// Attempts per completion request (1 = no retries)
    pub max_attempts: u32,

    /// Name of the person the chatbot represents
    pub persona_name: String,

    /// Directory with the persona context files
    pub persona_dir: PathBuf,

    /// Push notification credentials (None = log only)
    pub pushover: Option<PushoverConfig>,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENAI_API_KEY` or `PERSONA_NAME` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let api_key = required("OPENAI_API_KEY")?;
        let persona_name = required("PERSONA_NAME")?;

        let base_url = lookup("OPENAI_BASE_URL")
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        let default_model = lookup("DEFAULT_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

        let max_rounds: usize = parse_or(&lookup, "MAX_ROUNDS", 10)?;
        if max_rounds == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ROUNDS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let parallel_tool_calls = lookup("PARALLEL_TOOL_CALLS")
            .map(|v| {
                parse_bool(&v)
                    .map_err(|e| ConfigError::InvalidValue("PARALLEL_TOOL_CALLS".to_string(), e))
            })
            .transpose()?
            .unwrap_or(false);

        let request_timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 60)?;

        let max_attempts: u32 = parse_or(&lookup, "MAX_ATTEMPTS", 1)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let persona_dir = lookup("PERSONA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("me"));

        // Both halves are needed; one without the other falls back to log-only.
        let pushover = match (lookup("PUSHOVER_TOKEN"), lookup("PUSHOVER_USER")) {
            (Some(token), Some(user)) => Some(PushoverConfig { token, user }),
            _ => None,
        };

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "PORT", 7860)?;

        Ok(Self {
            api_key,
            base_url,
            default_model,
            max_rounds,
            parallel_tool_calls,
            request_timeout_secs,
            max_attempts,
            persona_name,
            persona_dir,
            pushover,
            host,
            port,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, persona_name: String, persona_dir: PathBuf) -> Self {
        Self {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            max_rounds: 10,
            parallel_tool_calls: false,
            request_timeout_secs: 60,
            max_attempts: 1,
            persona_name,
            persona_dir,
            pushover: None,
            host: "127.0.0.1".to_string(),
            port: 7860,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_required_vars_set() {
        let config = load(&[("OPENAI_API_KEY", "sk-test"), ("PERSONA_NAME", "Ada")]).unwrap();

        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.max_rounds, 10);
        assert!(!config.parallel_tool_calls);
        assert_eq!(config.persona_dir, PathBuf::from("me"));
        assert!(config.pushover.is_none());
        assert_eq!(config.port, 7860);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.max_attempts, 1);
    }

    #[test]
    fn max_attempts_is_parsed_and_zero_rejected() {
        let config = load(&[
            ("OPENAI_API_KEY", "sk"),
            ("PERSONA_NAME", "Ada"),
            ("MAX_ATTEMPTS", "3"),
        ])
        .unwrap();
        assert_eq!(config.max_attempts, 3);

        let err = load(&[
            ("OPENAI_API_KEY", "sk"),
            ("PERSONA_NAME", "Ada"),
            ("MAX_ATTEMPTS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "MAX_ATTEMPTS"));
    }

    #[test]
    fn missing_api_key_is_reported() {
        let err = load(&[("PERSONA_NAME", "Ada")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "OPENAI_API_KEY"));
    }

    #[test]
    fn zero_rounds_is_rejected() {
        let err = load(&[
            ("OPENAI_API_KEY", "sk"),
            ("PERSONA_NAME", "Ada"),
            ("MAX_ROUNDS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "MAX_ROUNDS"));
    }

    #[test]
    fn invalid_port_is_reported() {
        let err = load(&[
            ("OPENAI_API_KEY", "sk"),
            ("PERSONA_NAME", "Ada"),
            ("PORT", "not-a-port"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k, _) if k == "PORT"));
    }

    #[test]
    fn pushover_needs_both_token_and_user() {
        let partial = load(&[
            ("OPENAI_API_KEY", "sk"),
            ("PERSONA_NAME", "Ada"),
            ("PUSHOVER_TOKEN", "tok"),
        ])
        .unwrap();
        assert!(partial.pushover.is_none());

        let full = load(&[
            ("OPENAI_API_KEY", "sk"),
            ("PERSONA_NAME", "Ada"),
            ("PUSHOVER_TOKEN", "tok"),
            ("PUSHOVER_USER", "usr"),
            ("PARALLEL_TOOL_CALLS", "yes"),
        ])
        .unwrap();
        assert_eq!(full.pushover.map(|p| p.user).as_deref(), Some("usr"));
        assert!(full.parallel_tool_calls);
    }
}
