//! Prompt hub access.
//!
//! [`PromptHub`] is the seam between the publish/pull workflows in
//! [`sync`] and a concrete hub. [`LangSmithHub`] talks to the LangSmith
//! REST API when the `hub` feature is enabled.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::providers::ProviderError;

#[cfg(feature = "hub")]
mod langsmith;
pub mod manifest;
pub mod sync;

#[cfg(feature = "hub")]
pub use langsmith::{LangSmithHub, LANGSMITH_API_KEY_ENV};
pub use sync::{pull_prompt, push_prompt, PulledPrompt, PushOutcome, DEFAULT_PUSH_TAGS};

#[derive(Error, Debug)]
pub enum HubError {
    #[error("Prompt hub not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid prompt identifier '{0}': expected [owner/]name[:commit]")]
    InvalidIdentifier(String),

    #[error("Prompt not found on hub: {0}")]
    NotFound(String),

    #[error("Unreadable hub manifest: {0}")]
    Manifest(String),

    #[error("Hub request failed: {0}")]
    Request(#[from] ProviderError),
}

/// `[owner/]repo[:commit]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRef {
    pub owner: Option<String>,
    pub repo: String,
    pub commit: Option<String>,
}

impl PromptRef {
    pub fn parse(identifier: &str) -> Result<Self, HubError> {
        let invalid = || HubError::InvalidIdentifier(identifier.to_string());
        let trimmed = identifier.trim();

        let (path, commit) = match trimmed.split_once(':') {
            Some((path, commit)) if !commit.is_empty() => (path, Some(commit.to_string())),
            Some(_) => return Err(invalid()),
            None => (trimmed, None),
        };

        let (owner, repo) = match path.split_once('/') {
            Some((owner, repo)) => (Some(owner), repo),
            None => (None, path),
        };

        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid(repo) || owner.is_some_and(|o| !valid(o)) {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.map(str::to_string),
            repo: repo.to_string(),
            commit,
        })
    }

    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            repo: repo.into(),
            commit: None,
        }
    }

    /// `owner/repo`, or just `repo` when the owner is implicit.
    pub fn full_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}/{}", owner, self.repo),
            None => self.repo.clone(),
        }
    }
}

impl fmt::Display for PromptRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())?;
        if let Some(commit) = &self.commit {
            write!(f, ":{}", commit)?;
        }
        Ok(())
    }
}

/// A manifest fetched from the hub.
#[derive(Debug, Clone, PartialEq)]
pub struct HubCommit {
    pub commit_hash: String,
    pub manifest: Value,
}

/// Metadata applied when a repository is created or updated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepoOptions {
    pub description: String,
    pub tags: Vec<String>,
    pub is_public: bool,
}

#[async_trait]
pub trait PromptHub: Send + Sync {
    /// Fetch a manifest; `reference.commit == None` means the latest.
    async fn pull(&self, reference: &PromptRef) -> Result<HubCommit, HubError>;

    /// Create the repository if it is missing. Returns `true` if created.
    async fn ensure_repo(&self, reference: &PromptRef, options: &RepoOptions) -> Result<bool, HubError>;

    /// Commit a new manifest and return its hash.
    async fn commit(&self, reference: &PromptRef, manifest: &Value) -> Result<String, HubError>;

    /// Browser URL for a repository.
    fn prompt_url(&self, reference: &PromptRef) -> String;
}
