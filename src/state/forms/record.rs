//! Records as loaded from the registry API

use serde_json::{Map, Value};

/// A stored entity snapshot.
///
/// In edit mode this is the immutable diff baseline for the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Record {
    /// Wrap a JSON object; the id is read from `_id` or `id`.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(fields) = value else {
            return None;
        };
        let id = match fields.get("_id").or_else(|| fields.get("id"))? {
            Value::String(id) => id.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(Self { id, fields })
    }

    pub fn text(&self, key: &str) -> &str {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}
