//! Coercion procedure.
//!
//! `normalize(value, containers, scalar)` brings an input value into the exact
//! shape a class field declares. Each container level rebuilds the input
//! sequence as the *declared* container (a list input becomes a tuple when the
//! schema says tuple), and the leaf is cast to the declared scalar. The target
//! shape always comes from the schema-derived descriptor, never from the input,
//! which makes the procedure idempotent.
//!
//! [`normalize_json`] is the same procedure over `serde_json::Value`, used by
//! generated code where the container kind is carried by the Rust type.

use crate::error::CoercionError;
use crate::ir::{CoercionShape, ContainerKind, ScalarKind};
use crate::runtime::Value;

pub fn normalize(
    value: Value,
    containers: &[ContainerKind],
    scalar: Option<ScalarKind>,
) -> Result<Value, CoercionError> {
    let Some((container, rest)) = containers.split_first() else {
        return match scalar {
            Some(kind) => cast(value, kind),
            None => Ok(value),
        };
    };

    let items = match value {
        Value::List(xs) | Value::Tuple(xs) => xs,
        other => return Err(CoercionError::NotASequence { found: other.kind() }),
    };
    check_arity(*container, items.len())?;

    let items = items
        .into_iter()
        .map(|x| normalize(x, rest, scalar))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(match container {
        ContainerKind::List => Value::List(items),
        ContainerKind::Tuple(_) => Value::Tuple(items),
    })
}

pub fn normalize_shape(value: Value, shape: &CoercionShape) -> Result<Value, CoercionError> {
    normalize(value, &shape.containers, shape.scalar)
}

fn check_arity(container: ContainerKind, found: usize) -> Result<(), CoercionError> {
    match container {
        ContainerKind::Tuple(expected) if expected != found => {
            Err(CoercionError::Arity { expected, found })
        }
        _ => Ok(()),
    }
}

fn cast(value: Value, kind: ScalarKind) -> Result<Value, CoercionError> {
    let not_numeric = |found: String| CoercionError::NotNumeric { found, target: kind };
    match (kind, value) {
        (ScalarKind::Int, Value::Int(i)) => Ok(Value::Int(i)),
        (ScalarKind::Int, Value::Float(f)) => {
            integral(f).map(Value::Int).ok_or_else(|| not_numeric(format!("{f:?}")))
        }
        (ScalarKind::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
        (ScalarKind::Float, Value::Float(f)) => Ok(Value::Float(f)),
        (_, other) => Err(not_numeric(other.kind().to_string())),
    }
}

fn integral(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

// ------------------------------ JSON flavor ------------------------------- //

pub fn normalize_json(
    value: serde_json::Value,
    containers: &[ContainerKind],
    scalar: Option<ScalarKind>,
) -> Result<serde_json::Value, CoercionError> {
    use serde_json::Value as J;

    let Some((container, rest)) = containers.split_first() else {
        return match scalar {
            Some(kind) => cast_json(value, kind),
            None => Ok(value),
        };
    };
    let J::Array(items) = value else {
        return Err(CoercionError::NotASequence { found: json_kind(&value) });
    };
    check_arity(*container, items.len())?;
    items
        .into_iter()
        .map(|x| normalize_json(x, rest, scalar))
        .collect::<Result<Vec<_>, _>>()
        .map(J::Array)
}

fn cast_json(value: serde_json::Value, kind: ScalarKind) -> Result<serde_json::Value, CoercionError> {
    let serde_json::Value::Number(n) = value else {
        return Err(CoercionError::NotNumeric { found: json_kind(&value).to_string(), target: kind });
    };
    let not_numeric = || CoercionError::NotNumeric { found: n.to_string(), target: kind };
    match kind {
        ScalarKind::Int if n.is_i64() || n.is_u64() => Ok(serde_json::Value::Number(n.clone())),
        ScalarKind::Int => n.as_f64().and_then(integral).map(serde_json::Value::from).ok_or_else(not_numeric),
        ScalarKind::Float => n.as_f64().map(serde_json::Value::from).ok_or_else(not_numeric),
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "str",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn ints(xs: &[i64]) -> Vec<Value> {
        xs.iter().copied().map(Value::Int).collect()
    }

    #[test]
    fn list_becomes_declared_tuple() {
        let v = Value::List(ints(&[1, 2, 3, 4]));
        let out = normalize(v, &[ContainerKind::Tuple(4)], Some(ScalarKind::Int)).unwrap();
        assert_eq!(out, Value::Tuple(ints(&[1, 2, 3, 4])));
    }

    #[test]
    fn tuple_becomes_declared_list() {
        let v = Value::Tuple(vec![Value::Int(1), Value::Float(2.0)]);
        let out = normalize(v, &[ContainerKind::List], Some(ScalarKind::Float)).unwrap();
        assert_eq!(out, Value::List(vec![Value::Float(1.0), Value::Float(2.0)]));
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let v = Value::List(ints(&[1, 2, 3]));
        assert_eq!(
            normalize(v, &[ContainerKind::Tuple(4)], Some(ScalarKind::Int)),
            Err(CoercionError::Arity { expected: 4, found: 3 })
        );
    }

    #[test]
    fn non_sequences_and_non_numbers_are_rejected() {
        assert_eq!(
            normalize(Value::Int(1), &[ContainerKind::List], None),
            Err(CoercionError::NotASequence { found: "int" })
        );
        assert!(normalize(Value::Str("1".into()), &[], Some(ScalarKind::Int)).is_err());
        assert!(normalize(Value::Float(1.5), &[], Some(ScalarKind::Int)).is_err());
        assert_eq!(normalize(Value::Float(7.0), &[], Some(ScalarKind::Int)), Ok(Value::Int(7)));
    }

    #[test]
    fn nested_levels_follow_their_own_kind() {
        let v = Value::Tuple(vec![Value::List(ints(&[1, 2])), Value::Tuple(ints(&[3, 4]))]);
        let out = normalize(v, &[ContainerKind::List, ContainerKind::Tuple(2)], Some(ScalarKind::Int)).unwrap();
        assert_eq!(
            out,
            Value::List(vec![Value::Tuple(ints(&[1, 2])), Value::Tuple(ints(&[3, 4]))])
        );
    }

    #[test]
    fn json_flavor_casts_leaves() {
        let out = normalize_json(json!([1.0, 2, 3.0]), &[ContainerKind::Tuple(3)], Some(ScalarKind::Int)).unwrap();
        assert_eq!(out, json!([1, 2, 3]));
        assert!(normalize_json(json!([1, 2]), &[ContainerKind::Tuple(3)], None).is_err());
        assert!(normalize_json(json!(["a"]), &[ContainerKind::List], Some(ScalarKind::Float)).is_err());
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|i| Value::Int(i as i64)),
            (-1.0e6f64..1.0e6).prop_map(Value::Float),
            (-1000i32..1000).prop_map(|i| Value::Float(i as f64)),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
                prop::collection::vec(inner, 0..4).prop_map(Value::Tuple),
            ]
        })
    }

    fn arb_shape() -> impl Strategy<Value = (Vec<ContainerKind>, Option<ScalarKind>)> {
        let container = prop_oneof![Just(ContainerKind::List), (0usize..4).prop_map(ContainerKind::Tuple)];
        let scalar = prop_oneof![Just(None), Just(Some(ScalarKind::Int)), Just(Some(ScalarKind::Float))];
        (prop::collection::vec(container, 0..3), scalar)
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(v in arb_value(), (containers, scalar) in arb_shape()) {
            if let Ok(once) = normalize(v, &containers, scalar) {
                let twice = normalize(once.clone(), &containers, scalar);
                prop_assert_eq!(twice, Ok(once));
            }
        }
    }
}
