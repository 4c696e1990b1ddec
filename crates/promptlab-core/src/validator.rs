//! Validator: runs every prompt rule and collects the failures.
//!
//! The policy is simple and fixed:
//! 1. Every rule runs, whatever the others report
//! 2. Every failure becomes one entry in the report
//! 3. The record is valid iff the report has no entries
//!
//! Validation never fails and never touches the record. Callers decide what
//! an invalid report means (the publish path refuses to push).

use serde::Serialize;

use crate::prompt::PromptRecord;
use crate::rules::{default_rules, Rule, RuleId, Violation};

/// Outcome of validating one prompt record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<Violation>,
}

impl ValidationReport {
    fn from_violations(errors: Vec<Violation>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// The human-readable reasons, in report order.
    pub fn reasons(&self) -> Vec<&str> {
        self.errors.iter().map(|v| v.reason.as_str()).collect()
    }

    /// Rules that failed, each listed once, in report order.
    pub fn failed_rules(&self) -> Vec<RuleId> {
        let mut rules: Vec<RuleId> = Vec::new();
        for violation in &self.errors {
            if !rules.contains(&violation.rule) {
                rules.push(violation.rule);
            }
        }
        rules
    }
}

/// Runs a fixed set of rules over prompt records.
pub struct Validator {
    rules: Vec<Box<dyn Rule>>,
}

impl Validator {
    /// A validator with every built-in rule.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// A validator with a custom rule set.
    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    pub fn validate(&self, record: &PromptRecord) -> ValidationReport {
        let errors: Vec<Violation> = self
            .rules
            .iter()
            .flat_map(|rule| rule.violations(record))
            .collect();

        let report = ValidationReport::from_violations(errors);
        tracing::debug!(
            is_valid = report.is_valid,
            failed = ?report.failed_rules(),
            "prompt validated"
        );
        report
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a record against every built-in rule.
pub fn validate(record: &PromptRecord) -> ValidationReport {
    Validator::new().validate(record)
}
