//! Prompt records, templates and chat messages.
//!
//! Prompts are stored as YAML files mapping a name to a record and are
//! validated against an embedded JSON Schema when loaded.

mod message;
mod parser;
mod schema;
pub mod template;

pub use message::{ChatPrompt, PromptMessage};
pub use parser::{local_prompt_name, PromptError, PromptFile, PromptRecord, DEFAULT_USER_TEMPLATE};
pub use schema::{validate_prompt_file_schema, SchemaError};
pub use template::TemplateError;
