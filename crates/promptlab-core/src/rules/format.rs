use crate::prompt::PromptRecord;

use super::patterns::{contains_any_keyword, FORMAT_KEYWORDS};
use super::{Rule, RuleId};

/// The system prompt must say what shape the answer takes.
pub struct OutputFormatRule;

impl OutputFormatRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OutputFormatRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for OutputFormatRule {
    fn id(&self) -> RuleId {
        RuleId::OutputFormat
    }

    fn check(&self, record: &PromptRecord) -> Vec<String> {
        if contains_any_keyword(&record.system_prompt, FORMAT_KEYWORDS) {
            vec![]
        } else {
            vec![format!(
                "system_prompt does not specify an output format (expected one of: {})",
                FORMAT_KEYWORDS.join(", ")
            )]
        }
    }
}
