//! # promptlab-runtime
//!
//! Everything in promptlab that talks to the outside world.
//!
//! `promptlab-core` scores and validates without I/O. This crate adds:
//! - LLM providers (OpenAI, Google Gemini, Anthropic) behind [`LlmProvider`]
//! - the prompt hub client and the pull/push workflows
//! - the [`EvaluationRunner`], which runs a prompt over a dataset with
//!   bounded concurrency, retries, a response cache and a token budget
//! - environment configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use promptlab_core::{load_jsonl, PromptFile};
//! use promptlab_runtime::{EvaluationRunner, ProviderRegistry, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_env()?;
//! let registry = ProviderRegistry::with_defaults();
//! let provider = registry.create(&config.provider, &config.provider_json())?;
//! let default_model = registry.default_model(&config.provider).unwrap_or_default();
//! let completion = config.completion_config(&default_model);
//!
//! let prompts = PromptFile::from_yaml_file("prompts/bug_to_user_story_v2.yml")?;
//! let record = prompts.get("bug_to_user_story_v2")?;
//! let examples = load_jsonl("datasets/bug_to_user_story.jsonl")?;
//!
//! let run = EvaluationRunner::from_config(provider, &config, completion)
//!     .run(record, &examples)
//!     .await?;
//! let verdict = config.thresholds.judge(&run.summary()?);
//! ```

use thiserror::Error;

use promptlab_core::{DatasetError, PromptError, TemplateError, ValidationReport};

pub mod cache;
pub mod config;
pub mod hub;
pub mod providers;
pub mod resilience;
pub mod runner;

pub use cache::{CacheKey, ResponseCache};
pub use config::{ConfigError, HubConfig, RuntimeConfig};
pub use hub::{
    pull_prompt, push_prompt, HubError, PromptHub, PromptRef, PulledPrompt, PushOutcome,
};
#[cfg(feature = "hub")]
pub use hub::{LangSmithHub, LANGSMITH_API_KEY_ENV};
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    ProviderRegistry, TokenUsage,
};
pub use resilience::{BudgetTracker, LlmUsage, RetryPolicy};
pub use runner::{EvaluationRun, EvaluationRunner, ExampleOutcome, OutcomeStatus, SkipReason};

/// Prompt or dataset files that could not be read.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Errors from the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Prompt template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Model invocation failed: {0}")]
    ModelInvocation(#[from] ProviderError),

    #[error("{0}")]
    Hub(#[from] HubError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Token budget exceeded")]
    BudgetExceeded,

    #[error("No example could be evaluated")]
    NothingEvaluated,

    #[error("Prompt '{name}' failed validation with {} issue(s)", .report.errors.len())]
    Rejected {
        name: String,
        report: ValidationReport,
    },
}

impl From<PromptError> for RuntimeError {
    fn from(err: PromptError) -> Self {
        RuntimeError::Storage(StorageError::Prompt(err))
    }
}

impl From<DatasetError> for RuntimeError {
    fn from(err: DatasetError) -> Self {
        RuntimeError::Storage(StorageError::Dataset(err))
    }
}
