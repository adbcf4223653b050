//! Volatile-field stripping and stable hashing of JSON output.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::constants::VOLATILE_FIELDS;
use crate::hashing::stable_hash;

/// Field names removed before hashing: the built-in set plus `extra`.
pub fn volatile_fields<I, S>(extra: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    VOLATILE_FIELDS
        .iter()
        .map(|f| f.to_string())
        .chain(extra.into_iter().map(Into::into))
        .collect()
}

/// Recursively drops every object key in `volatile` and rebuilds objects with
/// sorted keys.
pub fn strip_volatile(value: &Value, volatile: &BTreeSet<String>) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().filter(|k| !volatile.contains(*k)).collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), strip_volatile(&map[key], volatile));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| strip_volatile(item, volatile))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Compact JSON bytes of an already-stripped value.
pub fn canonical_bytes(value: &Value) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(value)
}

/// BLAKE3 hex of `value` after stripping `volatile`.
pub fn stable_hash_value(value: &Value, volatile: &BTreeSet<String>) -> serde_json::Result<String> {
    Ok(stable_hash(&canonical_bytes(&strip_volatile(value, volatile))?))
}
