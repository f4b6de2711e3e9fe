//! Schema-driven model compiler for AsyncAPI message payloads.
//!
//! The compiler half loads a schema document ([`schema`]), synthesizes typed
//! classes ([`synth`], [`hoist`]) and renders them ([`codegen`], [`context`]).
//! The runtime half ([`coerce`], [`runtime`], [`support`]) is what generated
//! code and dynamic callers use to build validated payloads.
pub mod cli;
pub mod codegen;
pub mod coerce;
pub mod config;
pub mod context;
pub mod docs;
pub mod error;
pub mod hoist;
pub mod ir;
pub mod path_de;
pub mod pipeline;
pub mod registry;
pub mod runtime;
pub mod schema;
pub mod support;
pub mod synth;

pub use error::{CoercionError, CompileError, DecodeError, NameCollisionError, SchemaError, ValidationError};
pub use pipeline::{compile, compile_str, render, Artifacts, Compilation};
pub use runtime::{Instance, Model, Value};
