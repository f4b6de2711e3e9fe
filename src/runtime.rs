//! Dynamic model: constructs validated [`Instance`]s of emitted classes
//! without going through generated code.
//!
//! The rules here are the ones the generated Rust types enforce: closed
//! property sets, required/optional/default handling, literal sets, numeric
//! and length bounds, fixed arities, and per-field coercion before checking.
pub mod value;

pub use value::{Instance, Value};

use indexmap::IndexMap;
use ordered_float::OrderedFloat;

use crate::coerce;
use crate::error::{DecodeError, ValidationError};
use crate::ir::{ClassBody, ClassDefinition, FieldDef, NumberLit, ScalarKind, TypeExpr};

/// Every emitted class, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct Model {
    classes: IndexMap<String, ClassDefinition>,
}

impl Model {
    /// Build from already flattened classes. Auxiliary lists are dropped since
    /// every class is reachable by name.
    pub fn new<'a>(classes: impl IntoIterator<Item = &'a ClassDefinition>) -> Self {
        let classes = classes
            .into_iter()
            .map(|c| {
                let def = ClassDefinition {
                    name: c.name.clone(),
                    description: c.description.clone(),
                    body: c.body.clone(),
                    auxiliary: Vec::new(),
                };
                (c.name.clone(), def)
            })
            .collect();
        Model { classes }
    }

    pub fn class(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes.get(name)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Construct an instance of the record class `class` from raw input.
    pub fn construct(&self, class: &str, input: impl Into<Value>) -> Result<Instance, ValidationError> {
        let def = self.lookup(class)?;
        match &def.body {
            ClassBody::Record(fields) => {
                // an empty class takes no arguments at all
                let input = match input.into() {
                    Value::Null if fields.is_empty() => Value::Map(IndexMap::new()),
                    other => other,
                };
                self.record(&def.name, fields, input, &def.name)
            }
            ClassBody::Root(_) => Err(ValidationError::Type {
                path: def.name.clone(),
                expected: "a record class".into(),
                found: "a wrapper class".into(),
            }),
        }
    }

    /// Decode a JSON payload into `class`. An empty payload is read as `{}`.
    pub fn decode(&self, class: &str, payload: &[u8]) -> Result<Instance, DecodeError> {
        let payload: &[u8] = if payload.is_empty() { b"{}" } else { payload };
        let json: serde_json::Value = crate::path_de::from_slice_with_path(payload)?;
        if json.is_null() {
            return Err(ValidationError::NotAnObject { path: class.to_string(), found: "null" }.into());
        }
        Ok(self.construct(class, json)?)
    }

    fn lookup(&self, class: &str) -> Result<&ClassDefinition, ValidationError> {
        self.classes
            .get(class)
            .ok_or_else(|| ValidationError::UnknownClass(class.to_string()))
    }

    fn record(
        &self,
        class: &str,
        fields: &[FieldDef],
        input: Value,
        path: &str,
    ) -> Result<Instance, ValidationError> {
        let mut raw = match input {
            Value::Map(m) => m,
            Value::Instance(i) if i.class == class => return Ok(i),
            other => return Err(ValidationError::NotAnObject { path: path.to_string(), found: other.kind() }),
        };

        if let Some(unknown) = raw.keys().find(|k| !fields.iter().any(|f| &f.name == *k)) {
            return Err(ValidationError::UnknownField { class: class.to_string(), field: unknown.clone() });
        }

        let mut out = IndexMap::with_capacity(fields.len());
        for field in fields {
            let value = match raw.shift_remove(&field.name) {
                Some(v) => v,
                None if field.required => {
                    return Err(ValidationError::MissingField {
                        class: class.to_string(),
                        field: field.name.clone(),
                    });
                }
                None => field.default.as_ref().map(Value::from).unwrap_or(Value::Null),
            };
            let field_path = format!("{path}.{}", field.name);
            out.insert(field.name.clone(), self.field(field, value, &field_path)?);
        }
        Ok(Instance { class: class.to_string(), fields: out })
    }

    fn field(&self, field: &FieldDef, value: Value, path: &str) -> Result<Value, ValidationError> {
        let expression = &field.descriptor.expression;
        let skip = value.is_null() && expression.is_nullable();
        let value = if field.coerce() && !skip {
            coerce::normalize_shape(value, &field.descriptor.coercion)
                .map_err(|source| ValidationError::Coercion { path: path.to_string(), source })?
        } else {
            value
        };
        self.check(value, expression, path)
    }

    fn check(&self, value: Value, expr: &TypeExpr, path: &str) -> Result<Value, ValidationError> {
        match expr {
            TypeExpr::Nullable(_) if value.is_null() => Ok(Value::Null),
            TypeExpr::Nullable(inner) => self.check(value, inner, path),
            TypeExpr::Text { .. } => match value {
                Value::Str(s) => Ok(Value::Str(s)),
                other => Err(mismatch(path, "str", &other)),
            },
            TypeExpr::Literals { values, .. } => match value {
                Value::Str(s) if values.contains(&s) => Ok(Value::Str(s)),
                Value::Str(s) => Err(ValidationError::Literal {
                    path: path.to_string(),
                    value: s,
                    allowed: values.clone(),
                }),
                other => Err(mismatch(path, "str", &other)),
            },
            TypeExpr::Bool { .. } => match value {
                Value::Bool(b) => Ok(Value::Bool(b)),
                other => Err(mismatch(path, "bool", &other)),
            },
            TypeExpr::Numeric { scalar, bounds, .. } => {
                // only a coercion hook may turn a float into an int
                let value = match (scalar, value) {
                    (ScalarKind::Int, Value::Int(i)) => Value::Int(i),
                    (ScalarKind::Float, Value::Int(i)) => Value::Float(i as f64),
                    (ScalarKind::Float, Value::Float(f)) => Value::Float(f),
                    (_, other) => return Err(mismatch(path, &scalar.to_string(), &other)),
                };
                if let Some(lit) = number_lit(&value) {
                    if let Some(bound) = bounds.violation(lit) {
                        return Err(ValidationError::bound(path, lit, bound));
                    }
                }
                Ok(value)
            }
            TypeExpr::Class(name) => {
                let def = self.lookup(name)?;
                match &def.body {
                    ClassBody::Record(fields) => self.record(name, fields, value, path).map(Value::Instance),
                    // wrapper values are stored as the scalar they wrap
                    ClassBody::Root(inner) => self.check(value, inner, path),
                }
            }
            TypeExpr::Sequence { item, min_items, max_items } => {
                let items = sequence(value, path)?;
                let len = items.len();
                if let Some(min) = min_items.filter(|m| len < *m) {
                    return Err(ValidationError::length(path, len, format!(">= {min}")));
                }
                if let Some(max) = max_items.filter(|m| len > *m) {
                    return Err(ValidationError::length(path, len, format!("<= {max}")));
                }
                self.items(items, item, path).map(Value::List)
            }
            TypeExpr::Tuple { item, arity } => {
                let items = sequence(value, path)?;
                if items.len() != *arity {
                    return Err(ValidationError::length(path, items.len(), format!("== {arity}")));
                }
                self.items(items, item, path).map(Value::Tuple)
            }
        }
    }

    fn items(&self, items: Vec<Value>, item: &TypeExpr, path: &str) -> Result<Vec<Value>, ValidationError> {
        items
            .into_iter()
            .enumerate()
            .map(|(i, x)| self.check(x, item, &format!("{path}[{i}]")))
            .collect()
    }
}

fn sequence(value: Value, path: &str) -> Result<Vec<Value>, ValidationError> {
    match value {
        Value::List(xs) | Value::Tuple(xs) => Ok(xs),
        other => Err(mismatch(path, "sequence", &other)),
    }
}

fn number_lit(value: &Value) -> Option<NumberLit> {
    match value {
        Value::Int(i) => Some(NumberLit::Int(*i)),
        Value::Float(f) => Some(NumberLit::Float(OrderedFloat(*f))),
        _ => None,
    }
}

fn mismatch(path: &str, expected: &str, found: &Value) -> ValidationError {
    ValidationError::Type { path: path.to_string(), expected: expected.to_string(), found: found.kind().to_string() }
}
