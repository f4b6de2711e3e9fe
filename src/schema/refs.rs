//! Internal `$ref` resolution.
//!
//! Every `{"$ref": "#/a/b"}` object is replaced by a deep copy of the node it
//! points at, itself fully resolved. Only same-document pointers are allowed.

use serde_json::{Map, Value};

use crate::error::SchemaError;

pub fn resolve(root: &Value) -> Result<Value, SchemaError> {
    let mut stack = Vec::new();
    resolve_node(root, root, &mut stack)
}

fn resolve_node(root: &Value, node: &Value, stack: &mut Vec<String>) -> Result<Value, SchemaError> {
    match node {
        Value::Object(map) => {
            if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                return resolve_ref(root, reference, stack);
            }
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), resolve_node(root, v, stack)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(xs) => xs
            .iter()
            .map(|x| resolve_node(root, x, stack))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        scalar => Ok(scalar.clone()),
    }
}

fn resolve_ref(root: &Value, reference: &str, stack: &mut Vec<String>) -> Result<Value, SchemaError> {
    if stack.iter().any(|r| r == reference) {
        return Err(SchemaError::CyclicReference { reference: reference.to_string() });
    }
    let target = lookup(root, reference)?;
    stack.push(reference.to_string());
    let resolved = resolve_node(root, target, stack);
    stack.pop();
    resolved
}

/// Follow a `#/...` pointer within `root`.
pub fn lookup<'a>(root: &'a Value, reference: &str) -> Result<&'a Value, SchemaError> {
    let unresolved = || SchemaError::UnresolvedReference { reference: reference.to_string() };
    let pointer = reference.strip_prefix('#').ok_or_else(unresolved)?;
    if pointer.is_empty() {
        return Ok(root);
    }
    root.pointer(pointer).ok_or_else(unresolved)
}

/// Terminal segment of a pointer, e.g. `AVRPCMServo` for `#/components/messages/AVRPCMServo`.
pub fn terminal_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_references_resolve_transitively() {
        let doc = json!({
            "a": {"$ref": "#/b"},
            "b": {"inner": {"$ref": "#/c"}},
            "c": {"type": "integer"}
        });
        let out = resolve(&doc).unwrap();
        assert_eq!(out["a"], json!({"inner": {"type": "integer"}}));
    }

    #[test]
    fn shared_reference_is_not_a_cycle() {
        let doc = json!({
            "x": [{"$ref": "#/leaf"}, {"$ref": "#/leaf"}],
            "leaf": {"type": "string"}
        });
        let out = resolve(&doc).unwrap();
        assert_eq!(out["x"][1], json!({"type": "string"}));
    }

    #[test]
    fn cycles_are_schema_errors() {
        let doc = json!({
            "node": {"type": "object", "properties": {"child": {"$ref": "#/node"}}}
        });
        assert_eq!(
            resolve(&doc).unwrap_err(),
            SchemaError::CyclicReference { reference: "#/node".into() }
        );
    }

    #[test]
    fn dangling_and_external_references_fail() {
        let dangling = json!({"a": {"$ref": "#/missing"}});
        assert!(matches!(resolve(&dangling), Err(SchemaError::UnresolvedReference { .. })));

        let external = json!({"a": {"$ref": "other.yml#/x"}});
        assert!(matches!(resolve(&external), Err(SchemaError::UnresolvedReference { .. })));
    }

    #[test]
    fn terminal_name_takes_last_segment() {
        assert_eq!(terminal_name("#/components/messages/AVRPCMServo"), "AVRPCMServo");
    }
}
