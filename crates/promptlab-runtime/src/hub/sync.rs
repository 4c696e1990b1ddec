//! Pull prompts from a hub into local YAML, and push validated prompts back.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use promptlab_core::{local_prompt_name, validate, PromptFile, PromptRecord};

use super::{manifest, HubError, PromptHub, PromptRef, RepoOptions};
use crate::RuntimeError;

/// Tags every pushed prompt carries.
pub const DEFAULT_PUSH_TAGS: [&str; 2] = ["optimized", "bug-to-user-story"];

const PULLED_TAGS: [&str; 2] = ["langsmith", "pull"];

#[derive(Debug, Clone, PartialEq)]
pub struct PulledPrompt {
    /// Local prompt name, the repo part of the identifier
    pub name: String,
    pub path: PathBuf,
    pub record: PromptRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushOutcome {
    pub reference: PromptRef,
    pub commit_hash: String,
    pub url: String,
    pub tags: Vec<String>,
    /// Whether the repository was created by this push
    pub created: bool,
}

/// Fetch `identifier` and write it to `<prompts_dir>/<repo>.yml`.
///
/// The file holds one entry keyed by the repo name. The raw manifest is kept
/// on the record so nothing the hub stored is lost.
pub async fn pull_prompt(
    hub: &dyn PromptHub,
    identifier: &str,
    prompts_dir: &Path,
    today: NaiveDate,
) -> Result<PulledPrompt, RuntimeError> {
    let reference = PromptRef::parse(identifier)?;
    let commit = hub.pull(&reference).await?;
    let chat = manifest::decode(&commit.manifest)?;

    let name = local_prompt_name(&reference.full_name()).to_string();
    let record = PromptRecord {
        description: format!("Prompt pulled from hub: {}", identifier.trim()),
        system_prompt: chat.system_prompt(),
        user_prompt: chat.user_prompt(),
        tags: PULLED_TAGS.iter().map(|t| t.to_string()).collect(),
        techniques_applied: None,
        techniques: None,
        created_at: Some(today),
        version: Some("pulled".to_string()),
        hub_manifest: Some(commit.manifest),
    };

    std::fs::create_dir_all(prompts_dir).map_err(promptlab_core::PromptError::from)?;
    let path = prompts_dir.join(format!("{}.yml", name));
    PromptFile::single(name.clone(), record.clone()).write_yaml_file(&path)?;

    tracing::info!(
        prompt = %reference,
        commit = %commit.commit_hash,
        path = %path.display(),
        "saved pulled prompt"
    );

    Ok(PulledPrompt { name, path, record })
}

/// Validate the first prompt in `path` and publish it as `owner/<file stem>`.
///
/// Nothing is sent to the hub unless the prompt passes every rule.
pub async fn push_prompt(
    hub: &dyn PromptHub,
    owner: &str,
    path: &Path,
) -> Result<PushOutcome, RuntimeError> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| HubError::InvalidIdentifier(path.display().to_string()))?
        .to_string();
    let reference = PromptRef::parse(&format!("{}/{}", owner.trim(), name))?;

    let file = PromptFile::from_yaml_file(path)?;
    let (entry, record) = file.first().ok_or(promptlab_core::PromptError::Empty)?;
    tracing::debug!(prompt = %name, entry = %entry, "pushing first entry of prompt file");

    let report = validate(record);
    if !report.is_valid {
        return Err(RuntimeError::Rejected { name, report });
    }

    let manifest = manifest::encode(&record.chat_prompt())?;
    let tags = merge_tags(&record.tags, &DEFAULT_PUSH_TAGS);
    let description = if record.description.trim().is_empty() {
        format!("Optimized prompt: {}", name)
    } else {
        record.description.trim().to_string()
    };

    let options = RepoOptions {
        description,
        tags: tags.clone(),
        is_public: true,
    };
    let created = hub.ensure_repo(&reference, &options).await?;
    let commit_hash = hub.commit(&reference, &manifest).await?;

    Ok(PushOutcome {
        url: hub.prompt_url(&reference),
        reference,
        commit_hash,
        tags,
        created,
    })
}

/// Append each extra tag unless an equal tag, ignoring case, is present.
fn merge_tags(tags: &[String], extra: &[&str]) -> Vec<String> {
    let mut merged = tags.to_vec();
    for tag in extra {
        if !merged.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            merged.push(tag.to_string());
        }
    }
    merged
}
