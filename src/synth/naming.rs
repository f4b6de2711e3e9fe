use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SchemaError;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier regex")
});

/// Title-case every alphabetic run: first letter upper, rest lower.
///
/// `color_set` → `Color_Set`, `rgbLED` → `Rgbled`, `a1b` → `A1B`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(c);
            prev_cased = false;
        }
    }
    out
}

/// Child class name: parent chain plus the title-cased field name, separators stripped.
pub fn create_name(parent: &str, child: &str) -> String {
    format!("{parent}{}", title_case(child))
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

pub fn check_identifier(name: &str) -> Result<(), SchemaError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier { name: name.to_string() })
    }
}

pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}
