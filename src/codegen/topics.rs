use std::collections::HashMap;
use std::fmt::Write as _;

use crate::error::NameCollisionError;
use crate::ir::{Direction, MessageRegistryEntry};

use super::types::const_name;

/// Named topic constants plus a topic → message-type routing function.
pub fn emit_topics(entries: &[MessageRegistryEntry]) -> Result<String, NameCollisionError> {
    let mut taken: HashMap<String, &str> = HashMap::new();
    let mut consts = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = const_name(&entry.topic);
        if let Some(first) = taken.insert(name.clone(), &entry.topic) {
            return Err(NameCollisionError {
                name,
                first: first.to_string(),
                second: entry.topic.clone(),
            });
        }
        consts.push((name, entry));
    }

    let mut out = String::new();
    out.push_str("/// Channel topics and the message type carried on each.\n");
    out.push_str("pub mod topics {\n");
    for (name, entry) in &consts {
        let direction = match entry.direction {
            Direction::Publish => "publish",
            Direction::Subscribe => "subscribe",
        };
        let _ = writeln!(out, "    /// `{}` ({direction})", entry.message_type);
        let _ = writeln!(out, "    pub const {name}: &str = {:?};", entry.topic);
    }
    out.push('\n');
    out.push_str("    pub fn message_type_for_topic(topic: &str) -> Option<&'static str> {\n");
    out.push_str("        match topic {\n");
    for (name, entry) in &consts {
        let _ = writeln!(out, "            {name} => Some({:?}),", entry.message_type);
    }
    out.push_str("            _ => None,\n");
    out.push_str("        }\n");
    out.push_str("    }\n");
    out.push_str("}\n");
    Ok(out)
}
