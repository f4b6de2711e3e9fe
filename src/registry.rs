//! Callback stubs for the pub/sub adapter.
//!
//! One stub per distinct message type used by a channel, in order of first
//! use. Empty message types take no argument; every other type takes one
//! argument of its class.

use serde::Serialize;

use crate::error::SchemaError;
use crate::ir::ClassDefinition;
use crate::schema::MessageRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackStub {
    pub message_type: String,
    /// Argument class, `None` for zero-argument callbacks.
    pub payload: Option<String>,
}

impl CallbackStub {
    pub fn alias_name(&self) -> String {
        format!("{}Callable", self.message_type)
    }

    pub fn takes_payload(&self) -> bool {
        self.payload.is_some()
    }
}

pub fn callback_stubs<'a>(
    registry: &MessageRegistry,
    classes: impl IntoIterator<Item = &'a ClassDefinition> + Clone,
) -> Result<Vec<CallbackStub>, SchemaError> {
    let mut stubs = Vec::new();
    for message_type in registry.message_types() {
        let Some(class) = classes.clone().into_iter().find(|c| c.name == message_type) else {
            let channel = registry
                .entries()
                .iter()
                .find(|e| e.message_type == message_type)
                .map(|e| e.topic.clone())
                .unwrap_or_default();
            return Err(SchemaError::UnknownMessageType { channel, message: message_type.to_string() });
        };
        let payload = (!class.is_empty()).then(|| class.name.clone());
        tracing::debug!(message_type, zero_arg = payload.is_none(), "callback stub");
        stubs.push(CallbackStub { message_type: message_type.to_string(), payload });
    }
    Ok(stubs)
}
