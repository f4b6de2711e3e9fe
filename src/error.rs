//! Error taxonomy for the compiler and for the runtime side of generated models.
//!
//! Compile-time failures (`SchemaError`, `NameCollisionError`) abort the whole
//! run. Runtime failures (`CoercionError`, `ValidationError`, `DecodeError`) are
//! raised while constructing a model instance and name the field that failed.

use thiserror::Error;

use crate::ir::ScalarKind;

// ————————————————————————————————————————————————————————————————————————————
// COMPILE TIME
// ————————————————————————————————————————————————————————————————————————————

/// Malformed or unsupported schema input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("failed to read schema document {path}: {reason}")]
    Io { path: String, reason: String },

    /// The document (or one of its nodes) could not be decoded.
    #[error("at JSON path {path} → {message}")]
    Malformed { path: String, message: String },

    #[error("channel `{channel}` declares neither publish nor subscribe")]
    MissingDirection { channel: String },

    #[error("channel `{channel}` must reference its message through `$ref`")]
    InlineMessage { channel: String },

    #[error("cannot resolve reference `{reference}`")]
    UnresolvedReference { reference: String },

    #[error("reference `{reference}` is cyclic")]
    CyclicReference { reference: String },

    #[error("message `{message}` has no payload")]
    MissingPayload { message: String },

    #[error("`{class}` must be an object schema, found `{kind}`")]
    NotAnObject { class: String, kind: &'static str },

    /// Only closed objects (`additionalProperties: false`) can be compiled.
    #[error("`{class}` must set `additionalProperties: false`")]
    OpenObject { class: String },

    #[error("`{name}` is not a valid type identifier")]
    InvalidIdentifier { name: String },

    #[error("channel `{channel}` references unknown message type `{message}`")]
    UnknownMessageType { channel: String, message: String },

    #[error("{path}: {message}")]
    Invalid { path: String, message: String },
}

/// Two distinct schema paths synthesized the same name.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("name `{name}` synthesized for `{second}` is already taken by `{first}`")]
pub struct NameCollisionError {
    pub name: String,
    pub first: String,
    pub second: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    NameCollision(#[from] NameCollisionError),
    #[error("failed to serialize the render context: {0}")]
    RenderContext(String),
}

// ————————————————————————————————————————————————————————————————————————————
// RUNTIME
// ————————————————————————————————————————————————————————————————————————————

/// Raised by the coercion procedure when a value cannot take the declared shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("expected a sequence, found {found}")]
    NotASequence { found: &'static str },

    #[error("expected exactly {expected} elements, found {found}")]
    Arity { expected: usize, found: usize },

    #[error("{found} is not representable as {target}")]
    NotNumeric { found: String, target: ScalarKind },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("unknown class `{0}`")]
    UnknownClass(String),

    #[error("`{class}` does not accept property `{field}`")]
    UnknownField { class: String, field: String },

    #[error("`{class}` requires property `{field}`")]
    MissingField { class: String, field: String },

    #[error("{path}: expected an object, found {found}")]
    NotAnObject { path: String, found: &'static str },

    #[error("{path}: {source}")]
    Coercion {
        path: String,
        #[source]
        source: CoercionError,
    },

    #[error("{path}: expected {expected}, found {found}")]
    Type { path: String, expected: String, found: String },

    #[error("{path}: {value} violates bound {bound}")]
    Bound { path: String, value: String, bound: String },

    #[error("{path}: {len} elements violates length bound {bound}")]
    Length { path: String, len: usize, bound: String },

    #[error("{path}: `{value}` is not one of {allowed:?}")]
    Literal { path: String, value: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn bound(path: impl Into<String>, value: impl std::fmt::Display, bound: impl Into<String>) -> Self {
        Self::Bound { path: path.into(), value: value.to_string(), bound: bound.into() }
    }

    pub fn length(path: impl Into<String>, len: usize, bound: impl Into<String>) -> Self {
        Self::Length { path: path.into(), len, bound: bound.into() }
    }

    pub fn literal(path: impl Into<String>, value: &str, allowed: &[&str]) -> Self {
        Self::Literal {
            path: path.into(),
            value: value.to_string(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Failure to turn a raw payload into a generated model.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Parse(#[from] crate::path_de::PathError),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
