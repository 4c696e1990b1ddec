//! Prompting-technique resolution.
//!
//! Labels come from the first source that yields anything: the declared
//! `techniques_applied` list, the older `techniques` list, then the record's
//! tags (minus provenance tags).
//! When that leaves fewer than [`MIN_TECHNIQUES`] labels, the system prompt
//! is scanned instead and the inferred labels replace them.

use serde::Serialize;

use crate::prompt::PromptRecord;

use super::patterns::{detect_techniques, is_technique_tag};
use super::{Rule, RuleId};

/// Distinct techniques a publishable prompt must show.
pub const MIN_TECHNIQUES: usize = 2;

/// Where the resolved labels came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TechniqueSource {
    Declared,
    Tags,
    Inferred,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTechniques {
    pub source: TechniqueSource,
    pub labels: Vec<String>,
}

impl ResolvedTechniques {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Resolve the technique labels a record exposes.
pub fn resolve_techniques(record: &PromptRecord) -> ResolvedTechniques {
    let declared = [&record.techniques_applied, &record.techniques]
        .into_iter()
        .flatten()
        .map(|labels| distinct(labels.iter().map(String::as_str)))
        .find(|labels| !labels.is_empty())
        .unwrap_or_default();

    let (source, labels) = if !declared.is_empty() {
        (TechniqueSource::Declared, declared)
    } else {
        let tagged = distinct(
            record
                .tags
                .iter()
                .map(String::as_str)
                .filter(|tag| is_technique_tag(tag)),
        );
        (TechniqueSource::Tags, tagged)
    };

    if labels.len() >= MIN_TECHNIQUES {
        return ResolvedTechniques { source, labels };
    }

    ResolvedTechniques {
        source: TechniqueSource::Inferred,
        labels: detect_techniques(&record.system_prompt)
            .into_iter()
            .map(str::to_string)
            .collect(),
    }
}

/// Trimmed, non-empty labels, first spelling kept, compared ignoring case.
fn distinct<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for label in labels.map(str::trim).filter(|l| !l.is_empty()) {
        let key = label.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            out.push(label.to_string());
        }
    }
    out
}

/// At least [`MIN_TECHNIQUES`] distinct techniques must be resolvable.
pub struct MinimumTechniquesRule;

impl MinimumTechniquesRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MinimumTechniquesRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for MinimumTechniquesRule {
    fn id(&self) -> RuleId {
        RuleId::MinimumTechniques
    }

    fn check(&self, record: &PromptRecord) -> Vec<String> {
        let resolved = resolve_techniques(record);
        tracing::debug!(
            source = ?resolved.source,
            labels = ?resolved.labels,
            "techniques resolved"
        );

        if resolved.len() >= MIN_TECHNIQUES {
            vec![]
        } else {
            vec![format!(
                "Expected at least {} prompting techniques, found {}: [{}]",
                MIN_TECHNIQUES,
                resolved.len(),
                resolved.labels.join(", ")
            )]
        }
    }
}
