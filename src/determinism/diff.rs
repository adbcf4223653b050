//! Structural JSON diff.

use serde::Serialize;
use serde_json::Value;

/// One divergent location. `None` means the path is absent on that side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    pub path: String,
    pub left: Option<Value>,
    pub right: Option<Value>,
}

/// Lists every leaf path where `left` and `right` differ, in key order.
pub fn structural_diff(left: &Value, right: &Value) -> Vec<DiffEntry> {
    let mut out = Vec::new();
    walk("$", Some(left), Some(right), &mut out);
    out
}

fn walk(path: &str, left: Option<&Value>, right: Option<&Value>, out: &mut Vec<DiffEntry>) {
    match (left, right) {
        (Some(Value::Object(l)), Some(Value::Object(r))) => {
            let mut keys: Vec<&String> = l.keys().chain(r.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                walk(&format!("{path}.{key}"), l.get(key), r.get(key), out);
            }
        }
        (Some(Value::Array(l)), Some(Value::Array(r))) => {
            for i in 0..l.len().max(r.len()) {
                walk(&format!("{path}[{i}]"), l.get(i), r.get(i), out);
            }
        }
        (l, r) if l == r => {}
        (l, r) => out.push(DiffEntry {
            path: path.to_string(),
            left: l.cloned(),
            right: r.cloned(),
        }),
    }
}
