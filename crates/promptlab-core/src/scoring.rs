//! Text-overlap scoring.
//!
//! Compares a generated answer against a reference answer over bags of
//! lower-cased alphanumeric tokens. Tokens use set semantics: a word that
//! appears several times counts once on either side.
//!
//! | Measure | Definition | Degenerate case |
//! |---------|------------|-----------------|
//! | recall | \|ref ∩ cand\| / \|ref\| | empty reference → 1.0 |
//! | precision | \|ref ∩ cand\| / \|cand\| | empty candidate → 0.0 |
//! | F1 | 2·R·P / (R + P) | R + P = 0 → 0.0 |

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from the untyped scoring entry point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("{argument} must be text, found {found}")]
    InputType {
        argument: &'static str,
        found: &'static str,
    },
}

/// Recall, precision and F1 for one candidate/reference pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub recall: f64,
    pub precision: f64,
    /// F1, the harmonic mean of recall and precision
    pub score: f64,
}

/// Split text into its distinct lower-cased alphanumeric tokens.
///
/// Any character that is not alphanumeric (Unicode-aware) separates tokens,
/// so "não-funciona" yields `{"não", "funciona"}`.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Score a candidate answer against a reference answer.
///
/// `source` is the original input the candidate was generated from. It is
/// accepted so callers can pass the whole example through, but it does not
/// influence the score.
pub fn evaluate(candidate: &str, reference: &str, source: Option<&str>) -> ScoreResult {
    let candidate_tokens = tokenize(candidate);
    let reference_tokens = tokenize(reference);
    let overlap = reference_tokens.intersection(&candidate_tokens).count();

    let recall = if reference_tokens.is_empty() {
        1.0
    } else {
        overlap as f64 / reference_tokens.len() as f64
    };

    let precision = if candidate_tokens.is_empty() {
        0.0
    } else {
        overlap as f64 / candidate_tokens.len() as f64
    };

    let score = if recall + precision == 0.0 {
        0.0
    } else {
        2.0 * recall * precision / (recall + precision)
    };

    tracing::trace!(
        candidate_tokens = candidate_tokens.len(),
        reference_tokens = reference_tokens.len(),
        source_len = source.map(str::len),
        overlap,
        recall,
        precision,
        score,
        "scored candidate"
    );

    ScoreResult {
        recall,
        precision,
        score,
    }
}

/// Score raw JSON values, as read from a dataset.
///
/// Fails only when an argument is not a JSON string; empty strings score
/// normally.
pub fn evaluate_values(
    candidate: &Value,
    reference: &Value,
    source: Option<&Value>,
) -> Result<ScoreResult, ScoringError> {
    let candidate = expect_text("candidate", candidate)?;
    let reference = expect_text("reference", reference)?;
    let source = source.map(|s| expect_text("source", s)).transpose()?;
    Ok(evaluate(candidate, reference, source))
}

fn expect_text<'a>(argument: &'static str, value: &'a Value) -> Result<&'a str, ScoringError> {
    value.as_str().ok_or(ScoringError::InputType {
        argument,
        found: json_type_name(value),
    })
}

/// Name of a JSON value's type, for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
