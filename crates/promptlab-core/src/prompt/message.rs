//! Chat prompt messages.
//!
//! A chat prompt is an ordered list of role-tagged templates. Hub prompts
//! decode into this shape, and local prompt records are rendered from it.

use std::collections::BTreeMap;

use super::template::{self, TemplateError};

/// A single chat message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptMessage {
    System(String),
    User(String),
    /// Any other role (assistant, tool, placeholder...)
    Other { role: String, template: String },
}

impl PromptMessage {
    pub fn role(&self) -> &str {
        match self {
            PromptMessage::System(_) => "system",
            PromptMessage::User(_) => "user",
            PromptMessage::Other { role, .. } => role,
        }
    }

    pub fn template(&self) -> &str {
        match self {
            PromptMessage::System(t) | PromptMessage::User(t) => t,
            PromptMessage::Other { template, .. } => template,
        }
    }

    fn with_template(&self, template: String) -> Self {
        match self {
            PromptMessage::System(_) => PromptMessage::System(template),
            PromptMessage::User(_) => PromptMessage::User(template),
            PromptMessage::Other { role, .. } => PromptMessage::Other {
                role: role.clone(),
                template,
            },
        }
    }
}

/// An ordered chat prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatPrompt {
    messages: Vec<PromptMessage>,
}

impl ChatPrompt {
    pub fn new(messages: Vec<PromptMessage>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[PromptMessage] {
        &self.messages
    }

    /// All system templates, trimmed and joined by a blank line.
    pub fn system_prompt(&self) -> String {
        self.join(|m| matches!(m, PromptMessage::System(_)))
    }

    /// User templates plus any non-system role, trimmed and joined by a
    /// blank line. Other roles land here so no hub content is lost.
    pub fn user_prompt(&self) -> String {
        self.join(|m| !matches!(m, PromptMessage::System(_)))
    }

    fn join(&self, keep: impl Fn(&PromptMessage) -> bool) -> String {
        self.messages
            .iter()
            .filter(|m| keep(m))
            .map(|m| m.template().trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Placeholder names across all messages, in first-appearance order.
    pub fn input_variables(&self) -> Result<Vec<String>, TemplateError> {
        let mut names: Vec<String> = Vec::new();
        for message in &self.messages {
            for name in template::placeholders(message.template())? {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    /// Render every message against `values`.
    pub fn render(&self, values: &BTreeMap<String, String>) -> Result<ChatPrompt, TemplateError> {
        let messages = self
            .messages
            .iter()
            .map(|m| Ok(m.with_template(template::render(m.template(), values)?)))
            .collect::<Result<Vec<_>, TemplateError>>()?;
        Ok(ChatPrompt { messages })
    }
}
