//! Conversion between raw JSON (`serde_json::Value`) and [`Value`].
//!
//! The wire format uses JSON objects for two things: named records and
//! id-keyed dictionaries. No schema travels with a message, so the first
//! key decides. If it starts with one of [`COLLECTION_KEY_PREFIXES`] the
//! object becomes a [`Collection`]; otherwise (including the empty object)
//! it becomes a [`Record`].
//!
//! `serialize(&deserialize(x)) == x` holds for any JSON value that does not
//! reuse a collection prefix as a record field name. The reverse direction
//! only holds up to absent fields and explicit nulls reading the same.

use serde_json::Map;

use crate::{Collection, Record, Value};

/// First-key prefixes that mark a JSON object as a keyed collection.
pub const COLLECTION_KEY_PREFIXES: &[&str] = &["drone-", "order-"];

/// Returns `true` if `key` looks like a collection id.
pub fn is_collection_key(key: &str) -> bool {
    COLLECTION_KEY_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(prefix))
}

/// Converts raw JSON into a [`Value`]. Never fails.
pub fn deserialize(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Sequence(items.into_iter().map(deserialize).collect())
        }
        serde_json::Value::Object(map) => {
            let keyed = map.keys().next().is_some_and(|k| is_collection_key(k));
            let entries = map.into_iter().map(|(k, v)| (k, deserialize(v)));
            if keyed {
                Value::Collection(entries.collect::<Collection>())
            } else {
                Value::Record(entries.collect::<Record>())
            }
        }
    }
}

/// Converts a [`Value`] back into raw JSON, keeping field and key order.
pub fn serialize(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Value::Number(n.clone()),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Sequence(items) => {
            serde_json::Value::Array(items.iter().map(serialize).collect())
        }
        Value::Record(record) => serde_json::Value::Object(
            record
                .iter()
                .map(|(k, v)| (k.to_owned(), serialize(v)))
                .collect::<Map<String, serde_json::Value>>(),
        ),
        Value::Collection(collection) => serde_json::Value::Object(
            collection
                .entries()
                .iter()
                .map(|(k, v)| (k.clone(), serialize(v)))
                .collect::<Map<String, serde_json::Value>>(),
        ),
    }
}
