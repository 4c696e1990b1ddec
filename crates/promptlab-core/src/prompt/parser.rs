//! Prompt file parsing from YAML.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::message::{ChatPrompt, PromptMessage};
use super::schema::validate_prompt_file_schema;

/// User template used when a record leaves `user_prompt` blank.
pub const DEFAULT_USER_TEMPLATE: &str = "{bug_report}";

/// Errors that can occur when loading or saving prompt files.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to access prompt file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to convert prompt file: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Prompt file does not match schema: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("Prompt name must be a string, found {0}")]
    InvalidName(String),

    #[error("Prompt '{0}' not found")]
    NotFound(String),

    #[error("Prompt file contains no prompts")]
    Empty,
}

/// A stored prompt: templates plus publishing metadata.
///
/// Text fields tolerate explicit YAML nulls and read them as empty, so a
/// half-written record still loads and can be reported on by the validator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PromptRecord {
    /// What the prompt is for
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,

    /// System message template
    #[serde(default, deserialize_with = "null_as_empty")]
    pub system_prompt: String,

    /// User message template (blank means [`DEFAULT_USER_TEMPLATE`])
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_prompt: String,

    /// Free-form labels
    #[serde(default)]
    pub tags: Vec<String>,

    /// Prompting techniques the author declares
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub techniques_applied: Option<Vec<String>>,

    /// Older spelling of `techniques_applied`, read when that list is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub techniques: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDate>,

    /// Unquoted YAML numbers (`version: 2`) are read as text
    #[serde(
        default,
        deserialize_with = "version_as_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,

    /// Raw hub manifest, kept verbatim when a prompt is pulled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_manifest: Option<serde_json::Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VersionLabel {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn version_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<VersionLabel>::deserialize(deserializer)?.map(|label| match label {
            VersionLabel::Text(text) => text,
            VersionLabel::Integer(n) => n.to_string(),
            VersionLabel::Float(n) => n.to_string(),
        }),
    )
}

impl PromptRecord {
    /// Trimmed user template, falling back to [`DEFAULT_USER_TEMPLATE`].
    pub fn effective_user_prompt(&self) -> &str {
        let user = self.user_prompt.trim();
        if user.is_empty() {
            DEFAULT_USER_TEMPLATE
        } else {
            user
        }
    }

    /// Whether the record carries any prompt text at all.
    pub fn has_prompt_text(&self) -> bool {
        !self.system_prompt.trim().is_empty() || !self.user_prompt.trim().is_empty()
    }

    /// Build the two-message chat prompt sent to a model or pushed to a hub.
    pub fn chat_prompt(&self) -> ChatPrompt {
        ChatPrompt::new(vec![
            PromptMessage::System(self.system_prompt.trim().to_string()),
            PromptMessage::User(self.effective_user_prompt().to_string()),
        ])
    }
}

/// An ordered `name -> record` mapping, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptFile {
    entries: Vec<(String, PromptRecord)>,
}

impl PromptFile {
    /// A file holding exactly one prompt.
    pub fn single(name: impl Into<String>, record: PromptRecord) -> Self {
        Self {
            entries: vec![(name.into(), record)],
        }
    }

    /// Parse a prompt file from a YAML string.
    ///
    /// The document is checked against the embedded JSON Schema before any
    /// record is deserialized, so type errors are reported per field.
    pub fn from_yaml(yaml: &str) -> Result<Self, PromptError> {
        let document: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let mapping = match document {
            serde_yaml::Value::Mapping(mapping) => mapping,
            serde_yaml::Value::Null => return Err(PromptError::Empty),
            _ => {
                return Err(PromptError::SchemaError(vec![
                    "top level must be a mapping of prompt name to prompt".to_string(),
                ]))
            }
        };

        let as_json = serde_json::to_value(&mapping)?;
        validate_prompt_file_schema(&as_json).map_err(PromptError::SchemaError)?;

        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let name = match key {
                serde_yaml::Value::String(name) => name,
                other => return Err(PromptError::InvalidName(format!("{:?}", other))),
            };
            let record: PromptRecord = serde_yaml::from_value(value)?;
            entries.push((name, record));
        }

        if entries.is_empty() {
            return Err(PromptError::Empty);
        }

        Ok(Self { entries })
    }

    /// Parse a prompt file from disk.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, PromptError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Serialize back to YAML, preserving entry order.
    pub fn to_yaml(&self) -> Result<String, PromptError> {
        let mut mapping = serde_yaml::Mapping::new();
        for (name, record) in &self.entries {
            mapping.insert(
                serde_yaml::Value::String(name.clone()),
                serde_yaml::to_value(record)?,
            );
        }
        Ok(serde_yaml::to_string(&mapping)?)
    }

    /// Write the file, creating parent directories as needed.
    pub fn write_yaml_file(&self, path: impl AsRef<Path>) -> Result<(), PromptError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// The first entry in file order.
    pub fn first(&self) -> Option<(&str, &PromptRecord)> {
        self.entries.first().map(|(name, record)| (name.as_str(), record))
    }

    /// Look up a prompt by name.
    pub fn get(&self, name: &str) -> Result<&PromptRecord, PromptError> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, record)| record)
            .ok_or_else(|| PromptError::NotFound(name.to_string()))
    }

    /// Insert or replace a prompt.
    pub fn insert(&mut self, name: impl Into<String>, record: PromptRecord) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = record,
            None => self.entries.push((name, record)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PromptRecord)> {
        self.entries.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Local name for a hub identifier: `owner/repo` becomes `repo`.
pub fn local_prompt_name(identifier: &str) -> &str {
    identifier.rsplit('/').next().unwrap_or(identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT_FILE: &str = r#"
bug_to_user_story_v2:
  description: "Turns bug reports into user stories"
  system_prompt: |
    You are a product manager.
  user_prompt: "{bug_report}"
  version: "v2"
  created_at: "2025-01-15"
  tags: ["few-shot", "role-playing"]
  techniques_applied:
    - few-shot
    - role-playing
other_prompt:
  description: "Second"
  system_prompt: "Act as a reviewer."
"#;

    #[test]
    fn test_parse_prompt_file() {
        let file = PromptFile::from_yaml(PROMPT_FILE).unwrap();
        assert_eq!(file.len(), 2);
        assert_eq!(file.names(), vec!["bug_to_user_story_v2", "other_prompt"]);

        let (name, record) = file.first().unwrap();
        assert_eq!(name, "bug_to_user_story_v2");
        assert_eq!(record.description, "Turns bug reports into user stories");
        assert_eq!(record.version.as_deref(), Some("v2"));
        assert_eq!(
            record.created_at,
            Some(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
        );
        assert_eq!(
            record.techniques_applied,
            Some(vec!["few-shot".to_string(), "role-playing".to_string()])
        );
    }

    #[test]
    fn test_techniques_key() {
        let yaml = r#"
p:
  description: "d"
  system_prompt: "s"
  techniques: ["zero-shot", "step-by-step"]
"#;
        let file = PromptFile::from_yaml(yaml).unwrap();
        let record = file.get("p").unwrap();
        assert!(record.techniques_applied.is_none());
        assert_eq!(record.techniques.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_both_technique_keys_load() {
        let yaml = "p:\n  description: d\n  system_prompt: You are a PM.\n  techniques_applied: []\n  techniques: [few-shot, role-playing]\n";
        let file = PromptFile::from_yaml(yaml).unwrap();
        let record = file.get("p").unwrap();
        assert_eq!(record.techniques_applied, Some(vec![]));
        assert_eq!(
            record.techniques,
            Some(vec!["few-shot".to_string(), "role-playing".to_string()])
        );
    }

    #[test]
    fn test_numeric_version_reads_as_text() {
        for (raw, expected) in [("2", "2"), ("1.5", "1.5"), ("\"v2\"", "v2")] {
            let yaml = format!("p:\n  description: d\n  system_prompt: s\n  version: {}\n", raw);
            let file = PromptFile::from_yaml(&yaml).unwrap();
            assert_eq!(file.get("p").unwrap().version.as_deref(), Some(expected));
        }
    }

    #[test]
    fn test_null_fields_read_as_empty() {
        let yaml = r#"
p:
  description:
  system_prompt: "Act as a tester."
  user_prompt:
"#;
        let file = PromptFile::from_yaml(yaml).unwrap();
        let record = file.get("p").unwrap();
        assert!(record.description.is_empty());
        assert_eq!(record.effective_user_prompt(), DEFAULT_USER_TEMPLATE);
        assert!(record.has_prompt_text());
    }

    #[test]
    fn test_wrong_field_type_is_schema_error() {
        let yaml = r#"
p:
  description: "d"
  system_prompt: "s"
  tags: "not-a-list"
"#;
        let result = PromptFile::from_yaml(yaml);
        assert!(matches!(result, Err(PromptError::SchemaError(_))));
    }

    #[test]
    fn test_empty_document() {
        assert!(matches!(PromptFile::from_yaml(""), Err(PromptError::Empty)));
        assert!(matches!(PromptFile::from_yaml("{}"), Err(PromptError::Empty)));
    }

    #[test]
    fn test_missing_prompt_lookup() {
        let file = PromptFile::from_yaml(PROMPT_FILE).unwrap();
        assert!(matches!(file.get("nope"), Err(PromptError::NotFound(_))));
    }

    #[test]
    fn test_yaml_roundtrip_preserves_order_and_manifest() {
        let mut file = PromptFile::from_yaml(PROMPT_FILE).unwrap();
        let mut record = file.get("other_prompt").unwrap().clone();
        record.hub_manifest = Some(serde_json::json!({"lc": 1, "type": "constructor"}));
        file.insert("other_prompt", record);

        let reparsed = PromptFile::from_yaml(&file.to_yaml().unwrap()).unwrap();
        assert_eq!(reparsed, file);
    }

    #[test]
    fn test_write_and_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts").join("p.yml");
        let file = PromptFile::single(
            "p",
            PromptRecord {
                description: "d".to_string(),
                system_prompt: "You are a helper.".to_string(),
                ..Default::default()
            },
        );
        file.write_yaml_file(&path).unwrap();
        assert_eq!(PromptFile::from_yaml_file(&path).unwrap(), file);
    }

    #[test]
    fn test_chat_prompt_uses_default_user_template() {
        let record = PromptRecord {
            system_prompt: "  You are a PM.  ".to_string(),
            ..Default::default()
        };
        let chat = record.chat_prompt();
        assert_eq!(chat.system_prompt(), "You are a PM.");
        assert_eq!(chat.user_prompt(), "{bug_report}");
    }

    #[test]
    fn test_local_prompt_name() {
        assert_eq!(local_prompt_name("owner/bug_to_user_story_v1"), "bug_to_user_story_v1");
        assert_eq!(local_prompt_name("plain"), "plain");
    }
}
