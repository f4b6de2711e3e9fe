use serde_json::Value;

use crate::error::SchemaError;
use crate::ir::{Direction, MessageRegistryEntry};

use super::refs;

/// Topic → message-type registry, in channel declaration order. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageRegistry {
    entries: Vec<MessageRegistryEntry>,
}

impl MessageRegistry {
    pub fn new(entries: Vec<MessageRegistryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[MessageRegistryEntry] {
        &self.entries
    }

    pub fn message_for_topic(&self, topic: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.topic == topic)
            .map(|e| e.message_type.as_str())
    }

    /// Distinct message types, in order of first use.
    pub fn message_types(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for e in &self.entries {
            if !out.contains(&e.message_type.as_str()) {
                out.push(&e.message_type);
            }
        }
        out
    }
}

pub fn extract_registry(raw: &Value) -> Result<MessageRegistry, SchemaError> {
    let Some(channels) = raw.get("channels").and_then(Value::as_object) else {
        return Ok(MessageRegistry::default());
    };

    let mut entries = Vec::with_capacity(channels.len());
    for (topic, channel) in channels {
        let subscribe = channel.get("subscribe");
        let publish = channel.get("publish");
        let (operation, direction) = match (subscribe, publish) {
            (Some(s), Some(_)) => {
                tracing::warn!(topic = %topic, "channel declares both subscribe and publish; using subscribe");
                (s, Direction::Subscribe)
            }
            (Some(s), None) => (s, Direction::Subscribe),
            (None, Some(p)) => (p, Direction::Publish),
            (None, None) => {
                return Err(SchemaError::MissingDirection { channel: topic.clone() });
            }
        };

        let reference = operation
            .pointer("/message/$ref")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::InlineMessage { channel: topic.clone() })?;
        // dangling message pointers fail here rather than at stub emission
        refs::lookup(raw, reference)?;

        entries.push(MessageRegistryEntry {
            topic: topic.clone(),
            message_type: refs::terminal_name(reference).to_string(),
            direction,
        });
    }
    Ok(MessageRegistry::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(channels: Value) -> Value {
        json!({
            "channels": channels,
            "components": {"messages": {"A": {}, "B": {}}}
        })
    }

    #[test]
    fn missing_direction_fails() {
        let raw = doc(json!({"t/a": {"description": "nothing here"}}));
        assert_eq!(
            extract_registry(&raw).unwrap_err(),
            SchemaError::MissingDirection { channel: "t/a".into() }
        );
    }

    #[test]
    fn subscribe_wins_over_publish() {
        let raw = doc(json!({"t/a": {
            "publish": {"message": {"$ref": "#/components/messages/B"}},
            "subscribe": {"message": {"$ref": "#/components/messages/A"}}
        }}));
        let reg = extract_registry(&raw).unwrap();
        assert_eq!(reg.message_for_topic("t/a"), Some("A"));
        assert_eq!(reg.entries()[0].direction, Direction::Subscribe);
    }

    #[test]
    fn dangling_message_reference_fails() {
        let raw = doc(json!({"t/a": {"publish": {"message": {"$ref": "#/components/messages/Z"}}}}));
        assert!(matches!(extract_registry(&raw), Err(SchemaError::UnresolvedReference { .. })));
    }

    #[test]
    fn inline_message_fails() {
        let raw = doc(json!({"t/a": {"publish": {"message": {"payload": {"type": "object"}}}}}));
        assert_eq!(
            extract_registry(&raw).unwrap_err(),
            SchemaError::InlineMessage { channel: "t/a".into() }
        );
    }

    #[test]
    fn message_types_are_distinct_in_first_use_order() {
        let raw = doc(json!({
            "t/1": {"publish": {"message": {"$ref": "#/components/messages/B"}}},
            "t/2": {"publish": {"message": {"$ref": "#/components/messages/A"}}},
            "t/3": {"subscribe": {"message": {"$ref": "#/components/messages/B"}}}
        }));
        let reg = extract_registry(&raw).unwrap();
        assert_eq!(reg.message_types(), ["B", "A"]);
    }
}
