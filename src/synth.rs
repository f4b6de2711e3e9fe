//! Type synthesizer.
//!
//! Turns one [`SchemaNode`] in one naming context into a [`TypeDescriptor`]:
//! the runtime type expression, an optional static-analysis view of it, the
//! auxiliary classes that must be defined first, and the coercion shape.
//!
//! Objects recurse into the class emitter ([`class`]), which in turn calls
//! back into [`Synthesizer::synthesize`] for each property. Names handed out
//! during one run are tracked so two schema paths can never claim the same
//! class name.
pub mod arr;
pub mod class;
pub mod naming;
pub mod num;

use std::collections::HashMap;

use crate::error::{CompileError, NameCollisionError, SchemaError};
use crate::ir::{ScalarKind, TypeDescriptor, TypeExpr};
use crate::schema::{SchemaKind, SchemaNode};

/// Per-run synthesis state: assigned names and the schema path being visited.
#[derive(Debug, Default)]
pub struct Synthesizer {
    names: HashMap<String, String>,
    path: Vec<String>,
}

impl Synthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `synthesize(node, name, parent_name, required, nested)`.
    pub fn synthesize(
        &mut self,
        node: &SchemaNode,
        name: &str,
        parent_name: &str,
        required: bool,
        nested: bool,
    ) -> Result<TypeDescriptor, CompileError> {
        let mut descriptor = match &node.kind {
            SchemaKind::String { enum_: None, default } => {
                TypeDescriptor::plain(TypeExpr::Text { default: default.clone() })
            }
            SchemaKind::String { enum_: Some(values), default } => {
                self.check_literals(values, default.as_deref())?;
                TypeDescriptor::plain(TypeExpr::Literals {
                    values: values.clone(),
                    default: default.clone(),
                })
            }
            SchemaKind::Boolean { default } => {
                TypeDescriptor::plain(TypeExpr::Bool { default: *default })
            }
            SchemaKind::Integer(n) => num::synthesize(self, n, ScalarKind::Int, name, parent_name, nested)?,
            SchemaKind::Number(n) => num::synthesize(self, n, ScalarKind::Float, name, parent_name, nested)?,
            SchemaKind::Object(_) => {
                let class_name = naming::create_name(parent_name, name);
                let class = self.emit_class(&class_name, node)?;
                TypeDescriptor {
                    auxiliary: vec![class],
                    ..TypeDescriptor::plain(TypeExpr::Class(class_name))
                }
            }
            SchemaKind::Array(a) => {
                self.enter("items");
                let out = arr::synthesize(self, a, name, parent_name);
                self.leave();
                out?
            }
        };

        // omission is indistinguishable from null unless a default exists
        if !required {
            descriptor.make_nullable();
        }
        Ok(descriptor)
    }

    /// Reserve `name` for the node currently being visited.
    pub fn claim_name(&mut self, name: &str) -> Result<(), CompileError> {
        naming::check_identifier(name)?;
        let here = self.location();
        if let Some(first) = self.names.get(name) {
            return Err(NameCollisionError {
                name: name.to_string(),
                first: first.clone(),
                second: here,
            }
            .into());
        }
        tracing::trace!(name, path = %here, "claimed class name");
        self.names.insert(name.to_string(), here);
        Ok(())
    }

    /// Slash-joined schema path of the node being visited.
    pub fn location(&self) -> String {
        self.path.join("/")
    }

    pub fn invalid(&self, message: impl Into<String>) -> CompileError {
        SchemaError::Invalid { path: self.location(), message: message.into() }.into()
    }

    pub(crate) fn enter(&mut self, segment: impl Into<String>) {
        self.path.push(segment.into());
    }

    pub(crate) fn leave(&mut self) {
        self.path.pop();
    }

    fn check_literals(&self, values: &[String], default: Option<&str>) -> Result<(), CompileError> {
        if values.is_empty() {
            return Err(self.invalid("`enum` must list at least one value"));
        }
        if let Some(d) = default {
            if !values.iter().any(|v| v == d) {
                return Err(self.invalid(format!("default {d:?} is not one of {values:?}")));
            }
        }
        Ok(())
    }
}
