//! JSON Schema validation for prompt files.
//!
//! Prompt files are validated against `schema/prompt-file.schema.json`
//! before records are deserialized, so a malformed field is reported with
//! its location instead of as an opaque deserialization failure.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded prompt file schema (loaded at compile time).
const PROMPT_FILE_SCHEMA_JSON: &str = include_str!("../../schema/prompt-file.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(PROMPT_FILE_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate a prompt file (as JSON) against the schema.
///
/// Returns every violation, each suffixed with its instance path.
pub fn validate_prompt_file_schema(document: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(document)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file_passes() {
        let value = serde_json::json!({
            "bug_to_user_story_v1": {
                "description": "Pulled",
                "system_prompt": "You are a PM.",
                "user_prompt": "{bug_report}"
            }
        });
        assert!(validate_prompt_file_schema(&value).is_ok());
    }

    #[test]
    fn test_null_text_fields_pass() {
        let value = serde_json::json!({
            "p": { "description": null, "system_prompt": null }
        });
        assert!(validate_prompt_file_schema(&value).is_ok());
    }

    #[test]
    fn test_record_must_be_object() {
        let value = serde_json::json!({ "p": "just a string" });
        assert!(validate_prompt_file_schema(&value).is_err());
    }

    #[test]
    fn test_tags_must_be_strings() {
        let value = serde_json::json!({
            "p": { "system_prompt": "s", "tags": ["ok", 3] }
        });
        let errors = validate_prompt_file_schema(&value).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("/p/tags/1")));
    }

    #[test]
    fn test_created_at_must_be_iso_date() {
        let value = serde_json::json!({
            "p": { "system_prompt": "s", "created_at": "15/01/2025" }
        });
        assert!(validate_prompt_file_schema(&value).is_err());
    }

    #[test]
    fn test_prompt_name_pattern() {
        let value = serde_json::json!({
            "has spaces": { "system_prompt": "s" }
        });
        assert!(validate_prompt_file_schema(&value).is_err());
    }

    #[test]
    fn test_full_record_passes() {
        let value = serde_json::json!({
            "bug_to_user_story_v2": {
                "description": "Optimized",
                "system_prompt": "You are a product manager.",
                "user_prompt": "{bug_report}",
                "tags": ["few-shot", "role-playing"],
                "techniques_applied": ["few-shot", "role-playing"],
                "created_at": "2025-01-15",
                "version": "v2",
                "hub_manifest": { "lc": 1, "type": "constructor" },
                "extra_note": "unknown keys are tolerated"
            }
        });
        assert!(validate_prompt_file_schema(&value).is_ok());
    }
}
