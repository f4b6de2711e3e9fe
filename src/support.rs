//! Runtime support for generated payload modules.
//!
//! Generated code imports this module by path (`<crate>::support`) and uses
//! it for per-field coercion, validation helpers and payload decoding.

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::Deserialize;

pub use crate::coerce::normalize_json;
pub use crate::error::{DecodeError, ValidationError};
pub use crate::ir::{ContainerKind, ScalarKind};

/// Constraint checks that the type system cannot express on its own.
pub trait Validate {
    /// Check `self`, reporting failures under `path`.
    fn validate_at(&self, path: &str) -> Result<(), ValidationError>;

    fn validate(&self) -> Result<(), ValidationError> {
        let name = std::any::type_name::<Self>();
        self.validate_at(name.rsplit("::").next().unwrap_or(name))
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate_at(&self, path: &str) -> Result<(), ValidationError> {
        match self {
            Some(inner) => inner.validate_at(path),
            None => Ok(()),
        }
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate_at(&self, path: &str) -> Result<(), ValidationError> {
        self.as_slice().validate_at(path)
    }
}

impl<T: Validate, const N: usize> Validate for [T; N] {
    fn validate_at(&self, path: &str) -> Result<(), ValidationError> {
        self.as_slice().validate_at(path)
    }
}

impl<T: Validate> Validate for [T] {
    fn validate_at(&self, path: &str) -> Result<(), ValidationError> {
        self.iter()
            .enumerate()
            .try_for_each(|(i, x)| x.validate_at(&format!("{path}[{i}]")))
    }
}

/// `deserialize_with` hook: normalize the raw value to the declared shape, then decode it.
///
/// `null` is passed through untouched so optional fields keep working.
pub fn deserialize_coerced<'de, D, T>(
    deserializer: D,
    containers: &[ContainerKind],
    scalar: Option<ScalarKind>,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let value = if raw.is_null() {
        raw
    } else {
        normalize_json(raw, containers, scalar).map_err(D::Error::custom)?
    };
    serde_json::from_value(value).map_err(D::Error::custom)
}

pub fn check_len(
    path: &str,
    len: usize,
    min: Option<usize>,
    max: Option<usize>,
) -> Result<(), ValidationError> {
    if let Some(min) = min.filter(|m| len < *m) {
        return Err(ValidationError::length(path, len, format!(">= {min}")));
    }
    if let Some(max) = max.filter(|m| len > *m) {
        return Err(ValidationError::length(path, len, format!("<= {max}")));
    }
    Ok(())
}

pub fn check_literal(path: &str, value: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::literal(path, value, allowed))
    }
}

/// Decode a payload and run its checks. An empty payload is read as `{}`.
pub fn decode<T>(payload: &[u8]) -> Result<T, DecodeError>
where
    T: DeserializeOwned + Validate,
{
    let payload: &[u8] = if payload.is_empty() { b"{}" } else { payload };
    let value: T = crate::path_de::from_slice_with_path(payload)?;
    value.validate()?;
    Ok(value)
}

/// Serialize a payload for the wire.
pub fn encode<T: serde::Serialize>(payload: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(payload)
}
