//! Schema loader.
//!
//! Reads an AsyncAPI-style document, resolves internal `$ref` pointers into
//! inline subtrees, decodes every message payload into a typed [`SchemaNode`]
//! tree and extracts the topic → message-type registry.
pub mod channels;
pub mod refs;

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SchemaError;
use crate::ir::{Bounds, NumberLit};
use crate::path_de;

pub use channels::MessageRegistry;

// ------------------------------ Schema nodes ------------------------------ //

/// One typed property or message body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchemaNode {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: SchemaKind,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SchemaKind {
    String {
        #[serde(default, rename = "enum")]
        enum_: Option<Vec<String>>,
        #[serde(default)]
        default: Option<String>,
    },
    Integer(NumericSchema),
    Number(NumericSchema),
    Boolean {
        #[serde(default)]
        default: Option<bool>,
    },
    Object(ObjectSchema),
    Array(ArraySchema),
}

impl SchemaKind {
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::String { .. } => "string",
            SchemaKind::Integer(_) => "integer",
            SchemaKind::Number(_) => "number",
            SchemaKind::Boolean { .. } => "boolean",
            SchemaKind::Object(_) => "object",
            SchemaKind::Array(_) => "array",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericSchema {
    #[serde(default)]
    pub default: Option<NumberLit>,
    #[serde(default)]
    pub minimum: Option<NumberLit>,
    #[serde(default)]
    pub maximum: Option<NumberLit>,
    #[serde(default)]
    pub exclusive_minimum: Option<NumberLit>,
    #[serde(default)]
    pub exclusive_maximum: Option<NumberLit>,
}

impl NumericSchema {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            minimum: self.minimum,
            maximum: self.maximum,
            exclusive_minimum: self.exclusive_minimum,
            exclusive_maximum: self.exclusive_maximum,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSchema {
    #[serde(default)]
    pub properties: IndexMap<String, SchemaNode>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub additional_properties: Option<Value>,
}

impl ObjectSchema {
    /// Closed objects explicitly forbid undeclared properties.
    pub fn is_closed(&self) -> bool {
        matches!(self.additional_properties, Some(Value::Bool(false)))
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArraySchema {
    pub items: Box<SchemaNode>,
    #[serde(default)]
    pub min_items: Option<usize>,
    #[serde(default)]
    pub max_items: Option<usize>,
}

// ------------------------------- Document --------------------------------- //

#[derive(Debug, Clone, PartialEq)]
pub struct MessageSchema {
    pub name: String,
    pub description: Option<String>,
    pub payload: SchemaNode,
}

/// A fully dereferenced schema document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub messages: Vec<MessageSchema>,
    pub registry: MessageRegistry,
}

pub fn load_path(path: &Path) -> Result<Document, SchemaError> {
    let src = std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    tracing::debug!(path = %path.display(), bytes = src.len(), "read schema document");
    load_str(&src)
}

pub fn load_str(src: &str) -> Result<Document, SchemaError> {
    let raw: Value = path_de::from_yaml_str_with_path(src).map_err(malformed)?;
    load_value(raw)
}

pub fn load_value(raw: Value) -> Result<Document, SchemaError> {
    // registry comes from the raw tree: message names are the `$ref` targets
    let registry = channels::extract_registry(&raw)?;
    let resolved = refs::resolve(&raw)?;

    let mut messages = Vec::new();
    let entries = resolved
        .pointer("/components/messages")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    for (name, message) in entries {
        let Some(payload) = message.get("payload").cloned() else {
            return Err(SchemaError::MissingPayload { message: name });
        };
        let payload: SchemaNode = path_de::from_value_with_path(payload).map_err(|e| {
            SchemaError::Malformed {
                path: format!("components.messages.{name}.payload.{}", e.path),
                message: e.message,
            }
        })?;
        let description = message
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        messages.push(MessageSchema { name, description, payload });
    }

    tracing::debug!(
        messages = messages.len(),
        channels = registry.entries().len(),
        "loaded schema document"
    );
    Ok(Document { messages, registry })
}

fn malformed(e: path_de::PathError) -> SchemaError {
    SchemaError::Malformed { path: e.path, message: e.message }
}
