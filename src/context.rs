//! Render context handed to the external templating engine.
//!
//! Ordered classes (name, docs, fields) and ordered topic entries. The shape
//! is the whole contract with the templater, so it is plain serde data.

use serde::Serialize;

use crate::ir::{ClassBody, ClassDefinition, Literal, MessageRegistryEntry};
use crate::registry::CallbackStub;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderContext<'a> {
    pub classes: Vec<ClassContext<'a>>,
    pub topics: &'a [MessageRegistryEntry],
    pub callbacks: &'a [CallbackStub],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassContext<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    /// `record` or `wrapper`.
    pub kind: &'static str,
    pub fields: Vec<FieldContext<'a>>,
    /// Constraint carried by a wrapper class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wraps: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldContext<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<String>,
    pub required: bool,
    pub coerce: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'a Literal>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        classes: &[&'a ClassDefinition],
        topics: &'a [MessageRegistryEntry],
        callbacks: &'a [CallbackStub],
    ) -> Self {
        let classes = classes.iter().map(|c| ClassContext::new(c)).collect();
        RenderContext { classes, topics, callbacks }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl<'a> ClassContext<'a> {
    fn new(class: &'a ClassDefinition) -> Self {
        let (kind, wraps) = match &class.body {
            ClassBody::Record(_) => ("record", None),
            ClassBody::Root(expr) => ("wrapper", Some(expr.to_string())),
        };
        let fields = class
            .fields()
            .iter()
            .map(|f| FieldContext {
                name: &f.name,
                type_: f.descriptor.expression.to_string(),
                analysis_type: f.descriptor.analysis.as_ref().map(ToString::to_string),
                required: f.required,
                coerce: f.coerce(),
                doc: f.doc.as_deref(),
                default: f.default.as_ref(),
            })
            .collect();
        ClassContext { name: &class.name, description: class.description.as_deref(), kind, fields, wraps }
    }
}
