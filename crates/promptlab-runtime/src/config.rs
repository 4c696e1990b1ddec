//! Runtime configuration from environment variables.
//!
//! A `.env` file in the working directory is loaded first when present.
//! Secrets are not stored here; providers and the hub client read their
//! keys through [`ApiCredential`](crate::providers::ApiCredential).

use std::str::FromStr;
use std::time::Duration;

use serde_json::Value as JsonValue;
use thiserror::Error;

use promptlab_core::ThresholdPolicy;

use crate::providers::CompletionConfig;
use crate::resilience::RetryPolicy;

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_HUB_ENDPOINT: &str = "https://api.smith.langchain.com";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Prompt hub settings.
#[derive(Debug, Clone, PartialEq)]
pub struct HubConfig {
    pub endpoint: String,
    /// Owner handle that pushed prompts are published under
    pub username: Option<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_HUB_ENDPOINT.to_string(),
            username: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Provider type: "openai", "google" or "anthropic"
    pub provider: String,

    /// Model name; `None` uses the provider's default
    pub model: Option<String>,

    pub temperature: f32,
    pub max_tokens: u32,

    /// Per-attempt timeout
    pub timeout: Duration,

    pub max_retries: usize,

    /// Examples evaluated at once
    pub concurrency: usize,

    /// Total tokens a run may spend
    pub token_budget: Option<u64>,

    pub thresholds: ThresholdPolicy,

    pub hub: HubConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: None,
            temperature: 0.0,
            max_tokens: 2048,
            timeout: Duration::from_secs(60),
            max_retries: 3,
            concurrency: 4,
            token_budget: None,
            thresholds: ThresholdPolicy::default(),
            hub: HubConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load from the process environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let provider = get("LLM_PROVIDER")
            .map(|p| normalize_provider(&p))
            .unwrap_or(defaults.provider);

        let timeout = match get("LLM_TIMEOUT") {
            Some(raw) => parse_duration("LLM_TIMEOUT", &raw)?,
            None => defaults.timeout,
        };

        let concurrency: usize = parse_or("EVAL_CONCURRENCY", get("EVAL_CONCURRENCY"), defaults.concurrency)?;
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                var: "EVAL_CONCURRENCY",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let thresholds = ThresholdPolicy {
            min_f1: parse_or("EVAL_MIN_F1", get("EVAL_MIN_F1"), defaults.thresholds.min_f1)?,
            min_average: parse_or(
                "EVAL_MIN_AVERAGE",
                get("EVAL_MIN_AVERAGE"),
                defaults.thresholds.min_average,
            )?,
            recall_target: parse_or(
                "EVAL_RECALL_TARGET",
                get("EVAL_RECALL_TARGET"),
                defaults.thresholds.recall_target,
            )?,
        };

        Ok(Self {
            provider,
            model: get("LLM_MODEL"),
            temperature: parse_or("LLM_TEMPERATURE", get("LLM_TEMPERATURE"), defaults.temperature)?,
            max_tokens: parse_or("LLM_MAX_TOKENS", get("LLM_MAX_TOKENS"), defaults.max_tokens)?,
            timeout,
            max_retries: parse_or("LLM_MAX_RETRIES", get("LLM_MAX_RETRIES"), defaults.max_retries)?,
            concurrency,
            token_budget: get("EVAL_TOKEN_BUDGET")
                .map(|raw| parse("EVAL_TOKEN_BUDGET", &raw))
                .transpose()?,
            thresholds,
            hub: HubConfig {
                endpoint: get("LANGSMITH_ENDPOINT")
                    .map(|e| e.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.hub.endpoint),
                username: get("USERNAME_LANGSMITH_HUB"),
            },
        })
    }

    /// Completion settings, using `default_model` when none is configured.
    pub fn completion_config(&self, default_model: &str) -> CompletionConfig {
        CompletionConfig {
            model: self
                .model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.timeout,
        }
    }

    /// JSON handed to the provider factory.
    pub fn provider_json(&self) -> JsonValue {
        match &self.model {
            Some(model) => serde_json::json!({ "model": model }),
            None => serde_json::json!({}),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_retries(self.max_retries)
    }
}

/// Lower-case a provider name and resolve aliases.
pub fn normalize_provider(name: &str) -> String {
    match name.trim().to_lowercase().as_str() {
        "gemini" => "google".to_string(),
        "claude" => "anthropic".to_string(),
        other => other.to_string(),
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => parse(var, &raw),
        None => Ok(default),
    }
}

/// Accept humantime ("90s", "2m") or a bare number of seconds.
fn parse_duration(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw).map_err(|e| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
