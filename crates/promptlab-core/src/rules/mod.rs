//! Prompt-quality rules.
//!
//! Each rule is an independent, pure check over a [`PromptRecord`]. A rule
//! returns one reason per failure; an empty list means the record passes.
//!
//! | Rule | Looks at |
//! |------|----------|
//! | required-fields | description, system and user prompt |
//! | persona | system prompt |
//! | output-format | system prompt |
//! | few-shot | system prompt |
//! | no-todos | system and user prompt |
//! | minimum-techniques | techniques, tags, system prompt |

mod few_shot;
mod format;
pub mod patterns;
mod persona;
mod structure;
mod techniques;

pub use few_shot::FewShotRule;
pub use format::OutputFormatRule;
pub use persona::PersonaRule;
pub use structure::{NoTodosRule, RequiredFieldsRule};
pub use techniques::{
    resolve_techniques, MinimumTechniquesRule, ResolvedTechniques, TechniqueSource,
    MIN_TECHNIQUES,
};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::prompt::PromptRecord;

/// Identifies which rule produced a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    RequiredFields,
    Persona,
    OutputFormat,
    FewShot,
    NoTodos,
    MinimumTechniques,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::RequiredFields => "required-fields",
            RuleId::Persona => "persona",
            RuleId::OutputFormat => "output-format",
            RuleId::FewShot => "few-shot",
            RuleId::NoTodos => "no-todos",
            RuleId::MinimumTechniques => "minimum-techniques",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: RuleId,
    pub reason: String,
}

impl Violation {
    pub fn new(rule: RuleId, reason: impl Into<String>) -> Self {
        Self {
            rule,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.reason)
    }
}

/// A prompt-quality check.
///
/// Rules must be deterministic and must not depend on each other.
pub trait Rule: Send + Sync {
    /// Which rule this is.
    fn id(&self) -> RuleId;

    /// Human-readable reasons the record fails this rule.
    fn check(&self, record: &PromptRecord) -> Vec<String>;

    /// The reasons wrapped as violations.
    fn violations(&self, record: &PromptRecord) -> Vec<Violation> {
        let id = self.id();
        self.check(record)
            .into_iter()
            .map(|reason| Violation::new(id, reason))
            .collect()
    }
}

/// Every rule, in reporting order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(RequiredFieldsRule::new()),
        Box::new(PersonaRule::new()),
        Box::new(OutputFormatRule::new()),
        Box::new(FewShotRule::new()),
        Box::new(NoTodosRule::new()),
        Box::new(MinimumTechniquesRule::new()),
    ]
}
