//! Labeled evaluation datasets.
//!
//! A dataset is JSONL: one object per line with `inputs`, `outputs` and an
//! optional free-form `metadata` mapping. Blank lines are ignored.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::scoring::json_type_name;

/// Default input field holding the raw bug report.
pub const DEFAULT_INPUT_KEY: &str = "bug_report";

/// Default output field holding the reference answer.
pub const DEFAULT_REFERENCE_KEY: &str = "reference";

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid JSON on line {line}: {source}")]
    ParseError {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Field '{field}' must be text, found {found}")]
    FieldType { field: String, found: &'static str },
}

/// One labeled example.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatasetExample {
    #[serde(default)]
    pub inputs: Map<String, Value>,

    #[serde(default)]
    pub outputs: Map<String, Value>,

    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl DatasetExample {
    /// Text of an input field; a missing field reads as empty.
    pub fn input_text(&self, key: &str) -> Result<&str, DatasetError> {
        text_field(&self.inputs, "inputs", key)
    }

    /// Text of an output field; a missing field reads as empty.
    pub fn output_text(&self, key: &str) -> Result<&str, DatasetError> {
        text_field(&self.outputs, "outputs", key)
    }

    /// Raw JSON value of an input field.
    pub fn input_value(&self, key: &str) -> Option<&Value> {
        self.inputs.get(key)
    }

    /// Raw JSON value of an output field.
    pub fn output_value(&self, key: &str) -> Option<&Value> {
        self.outputs.get(key)
    }

    /// Complexity label, if the example carries one.
    pub fn complexity(&self) -> Option<&str> {
        self.metadata.get("complexity").and_then(Value::as_str)
    }

    /// String-valued inputs, usable as template values.
    pub fn template_values(&self) -> BTreeMap<String, String> {
        self.inputs
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect()
    }
}

fn text_field<'a>(
    map: &'a Map<String, Value>,
    section: &str,
    key: &str,
) -> Result<&'a str, DatasetError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(""),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(DatasetError::FieldType {
            field: format!("{}.{}", section, key),
            found: json_type_name(other),
        }),
    }
}

/// Parse a JSONL dataset from any reader.
pub fn read_jsonl(reader: impl Read) -> Result<Vec<DatasetExample>, DatasetError> {
    let mut examples = Vec::new();
    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let example = serde_json::from_str(line).map_err(|source| DatasetError::ParseError {
            line: index + 1,
            source,
        })?;
        examples.push(example);
    }
    tracing::debug!(examples = examples.len(), "dataset parsed");
    Ok(examples)
}

/// Load a JSONL dataset from disk.
pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Vec<DatasetExample>, DatasetError> {
    read_jsonl(File::open(path)?)
}
