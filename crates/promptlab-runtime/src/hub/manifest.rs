//! Hub manifest codec.
//!
//! The hub stores prompts as serialized constructor trees:
//!
//! ```json
//! {"lc": 1, "type": "constructor",
//!  "id": ["langchain", "prompts", "chat", "ChatPromptTemplate"],
//!  "kwargs": {"input_variables": [...], "messages": [ ...message templates... ]}}
//! ```
//!
//! Decoding is a total mapping onto [`PromptMessage`]: system and human
//! templates map to their variants, every other message kind becomes
//! [`PromptMessage::Other`] with a role derived from its kind.

use serde_json::{json, Map, Value};

use promptlab_core::{ChatPrompt, PromptMessage};

use super::HubError;

const CHAT_PROMPT: &str = "ChatPromptTemplate";
const PROMPT_TEMPLATE: &str = "PromptTemplate";

/// Encode a chat prompt as a hub manifest.
pub fn encode(prompt: &ChatPrompt) -> Result<Value, HubError> {
    let input_variables = prompt
        .input_variables()
        .map_err(|e| HubError::Manifest(e.to_string()))?;

    let messages = prompt
        .messages()
        .iter()
        .map(encode_message)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(constructor(
        &["langchain", "prompts", "chat", CHAT_PROMPT],
        json!({
            "input_variables": input_variables,
            "messages": messages,
        }),
    ))
}

fn encode_message(message: &PromptMessage) -> Result<Value, HubError> {
    let template = message.template();
    let input_variables = promptlab_core::prompt::template::placeholders(template)
        .map_err(|e| HubError::Manifest(e.to_string()))?;

    let prompt = constructor(
        &["langchain", "prompts", "prompt", PROMPT_TEMPLATE],
        json!({
            "input_variables": input_variables,
            "template": template,
            "template_format": "f-string",
        }),
    );

    let value = match message {
        PromptMessage::System(_) => constructor(
            &["langchain", "prompts", "chat", "SystemMessagePromptTemplate"],
            json!({ "prompt": prompt }),
        ),
        PromptMessage::User(_) => constructor(
            &["langchain", "prompts", "chat", "HumanMessagePromptTemplate"],
            json!({ "prompt": prompt }),
        ),
        PromptMessage::Other { role, .. } if role == "ai" || role == "assistant" => constructor(
            &["langchain", "prompts", "chat", "AIMessagePromptTemplate"],
            json!({ "prompt": prompt }),
        ),
        PromptMessage::Other { role, .. } => constructor(
            &["langchain", "prompts", "chat", "ChatMessagePromptTemplate"],
            json!({ "prompt": prompt, "role": role }),
        ),
    };
    Ok(value)
}

fn constructor(id: &[&str], kwargs: Value) -> Value {
    json!({
        "lc": 1,
        "type": "constructor",
        "id": id,
        "kwargs": kwargs,
    })
}

/// Decode a hub manifest into a chat prompt.
///
/// Accepts a chat prompt template, or a bare prompt template, which becomes
/// a single user message.
pub fn decode(manifest: &Value) -> Result<ChatPrompt, HubError> {
    let object = manifest
        .as_object()
        .ok_or_else(|| HubError::Manifest("manifest is not an object".to_string()))?;

    let kwargs = object.get("kwargs").and_then(Value::as_object);

    match class_name(object) {
        Some(PROMPT_TEMPLATE) => {
            let template = kwargs
                .and_then(|k| k.get("template"))
                .and_then(Value::as_str)
                .ok_or_else(|| HubError::Manifest("prompt template has no text".to_string()))?;
            Ok(ChatPrompt::new(vec![PromptMessage::User(template.to_string())]))
        }
        _ => {
            let messages = kwargs
                .and_then(|k| k.get("messages"))
                .and_then(Value::as_array)
                .ok_or_else(|| HubError::Manifest("manifest has no messages".to_string()))?;

            let decoded: Vec<PromptMessage> = messages.iter().map(decode_message).collect();
            if decoded.is_empty() {
                return Err(HubError::Manifest("manifest has no messages".to_string()));
            }
            Ok(ChatPrompt::new(decoded))
        }
    }
}

fn decode_message(value: &Value) -> PromptMessage {
    let empty = Map::new();
    let object = value.as_object().unwrap_or(&empty);
    let kwargs = object
        .get("kwargs")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let kind = class_name(object).unwrap_or("unknown");
    let template = message_template(kwargs);

    match kind {
        "SystemMessagePromptTemplate" | "SystemMessage" => PromptMessage::System(template),
        "HumanMessagePromptTemplate" | "HumanMessage" => PromptMessage::User(template),
        "AIMessagePromptTemplate" | "AIMessage" => PromptMessage::Other {
            role: "ai".to_string(),
            template,
        },
        "ChatMessagePromptTemplate" | "ChatMessage" => PromptMessage::Other {
            role: kwargs
                .get("role")
                .and_then(Value::as_str)
                .unwrap_or("chat")
                .to_string(),
            template,
        },
        "MessagesPlaceholder" => PromptMessage::Other {
            role: "placeholder".to_string(),
            template: kwargs
                .get("variable_name")
                .and_then(Value::as_str)
                .map(|name| format!("{{{}}}", name))
                .unwrap_or_default(),
        },
        other => PromptMessage::Other {
            role: other.to_string(),
            template,
        },
    }
}

/// Template text of a message: `kwargs.prompt.kwargs.template`, or the
/// `content` of a literal message.
fn message_template(kwargs: &Map<String, Value>) -> String {
    kwargs
        .get("prompt")
        .and_then(|p| p.get("kwargs"))
        .and_then(|k| k.get("template"))
        .and_then(Value::as_str)
        .or_else(|| kwargs.get("content").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

/// Last segment of the constructor `id` path.
fn class_name(object: &Map<String, Value>) -> Option<&str> {
    object
        .get("id")
        .and_then(Value::as_array)
        .and_then(|id| id.last())
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChatPrompt {
        ChatPrompt::new(vec![
            PromptMessage::System("Você é um PM. Use o formato {format}.".to_string()),
            PromptMessage::User("{bug_report}".to_string()),
        ])
    }

    #[test]
    fn test_encode_shape() {
        let manifest = encode(&sample()).unwrap();
        assert_eq!(manifest["lc"], 1);
        assert_eq!(manifest["id"][3], "ChatPromptTemplate");
        assert_eq!(
            manifest["kwargs"]["input_variables"],
            json!(["format", "bug_report"])
        );

        let system = &manifest["kwargs"]["messages"][0];
        assert_eq!(system["id"][3], "SystemMessagePromptTemplate");
        assert_eq!(
            system["kwargs"]["prompt"]["kwargs"]["template"],
            "Você é um PM. Use o formato {format}."
        );
        assert_eq!(system["kwargs"]["prompt"]["kwargs"]["template_format"], "f-string");
        assert_eq!(
            manifest["kwargs"]["messages"][1]["id"][3],
            "HumanMessagePromptTemplate"
        );
    }

    #[test]
    fn test_decode_encoded() {
        let prompt = sample();
        assert_eq!(decode(&encode(&prompt).unwrap()).unwrap(), prompt);
    }

    #[test]
    fn test_decode_other_kinds() {
        let manifest = json!({
            "lc": 1, "type": "constructor",
            "id": ["langchain", "prompts", "chat", "ChatPromptTemplate"],
            "kwargs": {"messages": [
                {"lc": 1, "type": "constructor",
                 "id": ["langchain", "prompts", "chat", "AIMessagePromptTemplate"],
                 "kwargs": {"prompt": {"kwargs": {"template": "Sure."}}}},
                {"lc": 1, "type": "constructor",
                 "id": ["langchain", "prompts", "chat", "MessagesPlaceholder"],
                 "kwargs": {"variable_name": "history"}},
                {"lc": 1, "type": "constructor",
                 "id": ["langchain_core", "messages", "SystemMessage"],
                 "kwargs": {"content": "Literal system text"}},
                {"lc": 1, "type": "constructor",
                 "id": ["langchain", "prompts", "chat", "ChatMessagePromptTemplate"],
                 "kwargs": {"role": "critic", "prompt": {"kwargs": {"template": "Review it"}}}},
                {"lc": 1, "type": "constructor",
                 "id": ["vendor", "FancyMessage"],
                 "kwargs": {}}
            ]}
        });

        let prompt = decode(&manifest).unwrap();
        assert_eq!(
            prompt.messages(),
            &[
                PromptMessage::Other { role: "ai".to_string(), template: "Sure.".to_string() },
                PromptMessage::Other { role: "placeholder".to_string(), template: "{history}".to_string() },
                PromptMessage::System("Literal system text".to_string()),
                PromptMessage::Other { role: "critic".to_string(), template: "Review it".to_string() },
                PromptMessage::Other { role: "FancyMessage".to_string(), template: String::new() },
            ]
        );
        assert_eq!(prompt.system_prompt(), "Literal system text");
    }

    #[test]
    fn test_decode_plain_prompt_template() {
        let manifest = json!({
            "lc": 1, "type": "constructor",
            "id": ["langchain", "prompts", "prompt", "PromptTemplate"],
            "kwargs": {"template": "Summarize: {bug_report}", "input_variables": ["bug_report"]}
        });
        let prompt = decode(&manifest).unwrap();
        assert_eq!(prompt.user_prompt(), "Summarize: {bug_report}");
        assert_eq!(prompt.system_prompt(), "");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(&json!("nope")), Err(HubError::Manifest(_))));
        assert!(matches!(decode(&json!({"kwargs": {}})), Err(HubError::Manifest(_))));
        assert!(matches!(
            decode(&json!({"kwargs": {"messages": []}})),
            Err(HubError::Manifest(_))
        ));
    }
}
