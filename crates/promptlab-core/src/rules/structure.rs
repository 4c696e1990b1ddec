//! Structural checks: required fields and leftover TODO markers.

use crate::prompt::PromptRecord;

use super::patterns::find_todos;
use super::{Rule, RuleId};

/// `description` and `system_prompt` must be filled in, and the record must
/// carry some prompt text.
pub struct RequiredFieldsRule;

impl RequiredFieldsRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RequiredFieldsRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for RequiredFieldsRule {
    fn id(&self) -> RuleId {
        RuleId::RequiredFields
    }

    fn check(&self, record: &PromptRecord) -> Vec<String> {
        let mut reasons = Vec::new();

        if record.description.trim().is_empty() {
            reasons.push("Missing required field: description".to_string());
        }
        if record.system_prompt.trim().is_empty() {
            reasons.push("Missing required field: system_prompt".to_string());
        }
        if !record.has_prompt_text() {
            reasons.push("Prompt has no text: system_prompt and user_prompt are both empty".to_string());
        }

        reasons
    }
}

/// Neither prompt may still contain a `[TODO]` or `TODO:` marker.
pub struct NoTodosRule;

impl NoTodosRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoTodosRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NoTodosRule {
    fn id(&self) -> RuleId {
        RuleId::NoTodos
    }

    fn check(&self, record: &PromptRecord) -> Vec<String> {
        let fields = [
            ("system_prompt", record.system_prompt.as_str()),
            ("user_prompt", record.user_prompt.as_str()),
        ];

        let offending: Vec<String> = fields
            .iter()
            .filter_map(|(field, text)| {
                let markers = find_todos(text);
                if markers.is_empty() {
                    None
                } else {
                    Some(format!("{} ({})", field, markers.join(", ")))
                }
            })
            .collect();

        if offending.is_empty() {
            vec![]
        } else {
            vec![format!(
                "Unresolved TODO found in {}",
                offending.join("; ")
            )]
        }
    }
}
