use crate::error::{CompileError, SchemaError};
use crate::ir::{ClassBody, ClassDefinition, FieldDef, Literal};
use crate::schema::{SchemaKind, SchemaNode};

use super::Synthesizer;

impl Synthesizer {
    /// Emit a top-level message class.
    pub fn emit_message(&mut self, name: &str, payload: &SchemaNode) -> Result<ClassDefinition, CompileError> {
        self.enter(format!("components/messages/{name}/payload"));
        let out = self.emit_class(name, payload);
        self.leave();
        out
    }

    /// `emit(name, object_node)`: build a complete class from a closed object schema.
    ///
    /// Properties are visited in schema order. Their auxiliary classes are
    /// hoisted onto this class (first occurrence wins), and each field keeps
    /// its description and coercion hook.
    pub fn emit_class(&mut self, name: &str, node: &SchemaNode) -> Result<ClassDefinition, CompileError> {
        let SchemaKind::Object(obj) = &node.kind else {
            return Err(SchemaError::NotAnObject { class: name.to_string(), kind: node.kind.name() }.into());
        };
        if !obj.is_closed() {
            return Err(SchemaError::OpenObject { class: name.to_string() }.into());
        }
        self.claim_name(name)?;

        if let Some(missing) = obj.required.iter().find(|r| !obj.properties.contains_key(*r)) {
            return Err(self.invalid(format!("required property `{missing}` is not declared")));
        }

        let mut auxiliary: Vec<ClassDefinition> = Vec::new();
        let mut fields = Vec::with_capacity(obj.properties.len());
        for (prop_name, prop) in &obj.properties {
            let required = obj.is_required(prop_name);

            self.enter(format!("properties/{prop_name}"));
            let descriptor = self.synthesize(prop, prop_name, name, required, false);
            self.leave();
            let mut descriptor = descriptor?;

            for aux in std::mem::take(&mut descriptor.auxiliary) {
                if !auxiliary.iter().any(|a| a.name == aux.name) {
                    auxiliary.push(aux);
                }
            }

            let default = if required {
                None
            } else {
                Some(descriptor.expression.default_literal().unwrap_or(Literal::Null))
            };
            fields.push(FieldDef {
                name: prop_name.clone(),
                descriptor,
                required,
                default,
                doc: prop.description.clone(),
            });
        }

        if fields.is_empty() {
            tracing::debug!(class = name, "emitting empty class");
        }
        Ok(ClassDefinition {
            name: name.to_string(),
            description: node.description.clone(),
            body: ClassBody::Record(fields),
            auxiliary,
        })
    }
}
