//! Few-shot evidence.
//!
//! Any one signal is enough: an example keyword, a labelled input/output
//! pair or a numbered example heading.

use crate::prompt::PromptRecord;

use super::patterns::{
    contains_any_keyword, has_labelled_example, has_numbered_example, EXAMPLE_KEYWORDS,
};
use super::{Rule, RuleId};

pub struct FewShotRule;

impl FewShotRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FewShotRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for FewShotRule {
    fn id(&self) -> RuleId {
        RuleId::FewShot
    }

    fn check(&self, record: &PromptRecord) -> Vec<String> {
        let system = &record.system_prompt;
        let found = contains_any_keyword(system, EXAMPLE_KEYWORDS)
            || has_labelled_example(system)
            || has_numbered_example(system);

        if found {
            vec![]
        } else {
            vec!["system_prompt contains no few-shot examples".to_string()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_system(system: &str) -> PromptRecord {
        PromptRecord {
            system_prompt: system.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_keyword_is_enough() {
        let rule = FewShotRule::new();
        assert!(rule.check(&with_system("See the sample below.")).is_empty());
        assert!(rule.check(&with_system("Veja o caso de uso.")).is_empty());
    }

    #[test]
    fn test_numbered_example() {
        let rule = FewShotRule::new();
        assert!(rule.check(&with_system("Exemplo 1 - login")).is_empty());
    }

    #[test]
    fn test_no_examples() {
        let rule = FewShotRule::new();
        assert_eq!(rule.check(&with_system("You are a PM.")).len(), 1);
    }
}
