//! Persona declaration.

use crate::prompt::PromptRecord;

use super::patterns::find_persona;
use super::{Rule, RuleId};

/// The system prompt must give the model a role.
pub struct PersonaRule;

impl PersonaRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PersonaRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for PersonaRule {
    fn id(&self) -> RuleId {
        RuleId::Persona
    }

    fn check(&self, record: &PromptRecord) -> Vec<String> {
        match find_persona(&record.system_prompt) {
            Some(pattern) => {
                tracing::debug!(pattern, "persona declared");
                vec![]
            }
            None => vec![
                "system_prompt does not declare a persona (e.g. \"You are a...\", \"Você é um...\", \"Act as...\")"
                    .to_string(),
            ],
        }
    }
}
