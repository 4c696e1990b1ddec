//! LangSmith prompt hub client.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | pull | `GET /commits/{owner}/{repo}/{commit or latest}` |
//! | create repo | `POST /repos/` (409 when it already exists) |
//! | update repo | `PATCH /repos/{owner}/{repo}` |
//! | commit | `POST /commits/{owner}/{repo}` |
//!
//! An implicit owner is sent as `-`, which the hub resolves to the
//! caller's own handle.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{HubCommit, HubError, PromptHub, PromptRef, RepoOptions};
use crate::config::HubConfig;
use crate::providers::{http, ApiCredential, CredentialSource, ProviderError};

pub const LANGSMITH_API_KEY_ENV: &str = "LANGSMITH_API_KEY";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const WEB_URL: &str = "https://smith.langchain.com/prompts";

pub struct LangSmithHub {
    credential: ApiCredential,
    endpoint: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for LangSmithHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LangSmithHub")
            .field("credential", &self.credential)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl LangSmithHub {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(
                api_key,
                CredentialSource::Programmatic,
                "LangSmith API key",
            ),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build from hub config, reading `LANGSMITH_API_KEY`.
    pub fn from_config(config: &HubConfig) -> Result<Self, HubError> {
        let credential = ApiCredential::from_env(LANGSMITH_API_KEY_ENV, "LangSmith API key")
            .map_err(|e| HubError::NotConfigured(e.to_string()))?;
        Ok(Self {
            credential,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn owner(reference: &PromptRef) -> &str {
        reference.owner.as_deref().unwrap_or("-")
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("x-api-key", self.credential.expose())
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("x-api-key", self.credential.expose())
    }

    fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .patch(self.url(path))
            .header("x-api-key", self.credential.expose())
    }
}

#[derive(Debug, Deserialize)]
struct CommitManifestResponse {
    commit_hash: String,
    manifest: Value,
}

#[derive(Debug, Serialize)]
struct CreateRepoRequest<'a> {
    repo_handle: &'a str,
    description: &'a str,
    tags: &'a [String],
    is_public: bool,
}

#[derive(Debug, Serialize)]
struct UpdateRepoRequest<'a> {
    description: &'a str,
    tags: &'a [String],
    is_public: bool,
}

#[derive(Debug, Serialize)]
struct CreateCommitRequest<'a> {
    manifest: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_commit: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CreateCommitResponse {
    commit: CommitInfo,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    commit_hash: String,
}

fn is_status(error: &ProviderError, wanted: u16) -> bool {
    matches!(error, ProviderError::ApiError { status, .. } if *status == wanted)
}

#[async_trait]
impl PromptHub for LangSmithHub {
    async fn pull(&self, reference: &PromptRef) -> Result<HubCommit, HubError> {
        let path = format!(
            "/commits/{}/{}/{}",
            Self::owner(reference),
            reference.repo,
            reference.commit.as_deref().unwrap_or("latest")
        );
        tracing::info!(prompt = %reference, "pulling prompt from hub");

        let body: CommitManifestResponse = http::send_json(self.get(&path), REQUEST_TIMEOUT)
            .await
            .map_err(|e| {
                if is_status(&e, 404) {
                    HubError::NotFound(reference.to_string())
                } else {
                    HubError::Request(e)
                }
            })?;

        Ok(HubCommit {
            commit_hash: body.commit_hash,
            manifest: body.manifest,
        })
    }

    async fn ensure_repo(&self, reference: &PromptRef, options: &RepoOptions) -> Result<bool, HubError> {
        let create = CreateRepoRequest {
            repo_handle: &reference.repo,
            description: &options.description,
            tags: &options.tags,
            is_public: options.is_public,
        };

        match http::send(self.post("/repos/").json(&create), REQUEST_TIMEOUT).await {
            Ok(_) => {
                tracing::info!(prompt = %reference.full_name(), "created hub repository");
                Ok(true)
            }
            Err(e) if is_status(&e, 409) => {
                let update = UpdateRepoRequest {
                    description: &options.description,
                    tags: &options.tags,
                    is_public: options.is_public,
                };
                let path = format!("/repos/{}/{}", Self::owner(reference), reference.repo);
                http::send(self.patch(&path).json(&update), REQUEST_TIMEOUT).await?;
                tracing::debug!(prompt = %reference.full_name(), "hub repository exists, metadata updated");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn commit(&self, reference: &PromptRef, manifest: &Value) -> Result<String, HubError> {
        let latest = PromptRef {
            commit: None,
            ..reference.clone()
        };
        let parent = match self.pull(&latest).await {
            Ok(commit) => Some(commit.commit_hash),
            Err(HubError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        let request = CreateCommitRequest {
            manifest,
            parent_commit: parent.as_deref(),
        };
        let path = format!("/commits/{}/{}", Self::owner(reference), reference.repo);
        let body: CreateCommitResponse =
            http::send_json(self.post(&path).json(&request), REQUEST_TIMEOUT).await?;

        tracing::info!(
            prompt = %reference.full_name(),
            commit = %body.commit.commit_hash,
            "committed prompt to hub"
        );
        Ok(body.commit.commit_hash)
    }

    fn prompt_url(&self, reference: &PromptRef) -> String {
        format!("{}/{}", WEB_URL, reference.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash() {
        let hub = LangSmithHub::new("key", "https://api.smith.langchain.com/");
        assert_eq!(hub.url("/repos/"), "https://api.smith.langchain.com/repos/");
    }

    #[test]
    fn test_prompt_url() {
        let hub = LangSmithHub::new("key", "https://api.smith.langchain.com");
        assert_eq!(
            hub.prompt_url(&PromptRef::new("acme", "bug_to_user_story_v2")),
            "https://smith.langchain.com/prompts/acme/bug_to_user_story_v2"
        );
    }

    #[test]
    fn test_implicit_owner() {
        assert_eq!(LangSmithHub::owner(&PromptRef::parse("story").unwrap()), "-");
    }

    #[test]
    fn test_commit_request_shape() {
        let manifest = serde_json::json!({"lc": 1});
        let first = serde_json::to_value(CreateCommitRequest {
            manifest: &manifest,
            parent_commit: None,
        })
        .unwrap();
        assert!(first.get("parent_commit").is_none());

        let next = serde_json::to_value(CreateCommitRequest {
            manifest: &manifest,
            parent_commit: Some("abc123"),
        })
        .unwrap();
        assert_eq!(next["parent_commit"], "abc123");
    }

    #[test]
    fn test_pull_response_parsing() {
        let body: CommitManifestResponse = serde_json::from_str(
            r#"{"commit_hash": "f00d", "manifest": {"lc": 1, "id": ["x"]}, "examples": []}"#,
        )
        .unwrap();
        assert_eq!(body.commit_hash, "f00d");
        assert_eq!(body.manifest["lc"], 1);
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let debug = format!("{:?}", LangSmithHub::new("lsv2_pt_secret", "https://x"));
        assert!(!debug.contains("lsv2_pt_secret"));
    }
}
