//! # promptlab-core
//!
//! Deterministic scoring and validation for bug-to-user-story prompts.
//!
//! This crate answers two questions without ever calling a model:
//! - How close is a generated answer to the reference answer?
//! - Is this prompt fit to publish?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same input, same output
//! 2. **No I/O in the engines**: scoring and validation take explicit inputs
//! 3. **Never silent**: every failed rule is reported with a reason
//!
//! ## Example
//!
//! ```rust,ignore
//! use promptlab_core::{evaluate, validate, PromptFile};
//!
//! let prompts = PromptFile::from_yaml_file("prompts/bug_to_user_story_v2.yml")?;
//! let (_, record) = prompts.first().unwrap();
//! let report = validate(record);
//! for violation in &report.errors {
//!     println!("{}", violation);
//! }
//!
//! let result = evaluate("login button crashes on click",
//!                       "the login button crashes when clicked", None);
//! println!("F1 = {:.3}", result.score);
//! ```

pub mod dataset;
pub mod prompt;
pub mod report;
pub mod rules;
pub mod scoring;
pub mod validator;

// Re-export main types at crate root
pub use dataset::{
    load_jsonl, read_jsonl, DatasetError, DatasetExample, DEFAULT_INPUT_KEY,
    DEFAULT_REFERENCE_KEY,
};
pub use prompt::{
    local_prompt_name, ChatPrompt, PromptError, PromptFile, PromptMessage, PromptRecord,
    TemplateError, DEFAULT_USER_TEMPLATE,
};
pub use report::{RunSummary, ThresholdPolicy, Verdict};
pub use rules::{resolve_techniques, Rule, RuleId, TechniqueSource, Violation};
pub use scoring::{evaluate, evaluate_values, tokenize, ScoreResult, ScoringError};
pub use validator::{validate, ValidationReport, Validator};
