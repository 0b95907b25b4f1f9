//! Lenient deserializers for fields the upstream does not type strictly.

use serde::{Deserialize as _, Deserializer};
use serde_json::Value;

/// Accept any JSON value as an opaque label.
///
/// Strings are taken as-is, `null` becomes an empty string, anything else is
/// kept as its compact JSON text.
pub(crate) fn opaque_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(label) => label,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Accept an error description as either a string or an error object.
///
/// Objects carrying a string `message` field resolve to that message.
pub(crate) fn error_description<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Some(message) = value.get("message").and_then(Value::as_str) {
        return Ok(message.to_owned());
    }

    Ok(match value {
        Value::String(description) => description,
        Value::Null => "unknown error".to_owned(),
        other => other.to_string(),
    })
}
