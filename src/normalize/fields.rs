//! Accessors for loosely-typed upstream JSON.
//!
//! Upstream items are opaque documents. Parsers pull only the named fields they
//! understand through these helpers; anything missing or blank becomes `None`.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Trimmed, non-empty text for `key`. Numbers and booleans are rendered as text.
pub fn text(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First non-empty text among `keys`
pub fn first_text(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text(item, key))
}

/// Numeric value for `key`, accepting both JSON numbers and numeric strings
pub fn number(item: &Value, key: &str) -> Option<f64> {
    match item.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Joins the non-empty parts with a single space
pub fn join_text(parts: &[Option<String>]) -> Option<String> {
    let joined = parts
        .iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}

/// Normalizes an "items" node into a list: an array is taken as-is, a single
/// object becomes a list of one, anything else (absent, null, `""`) is empty.
pub fn item_list(node: Option<&Value>) -> Vec<Value> {
    match node {
        Some(Value::Array(items)) => items.clone(),
        Some(obj @ Value::Object(_)) => vec![obj.clone()],
        _ => Vec::new(),
    }
}

/// Value stored under the first key of an object, in document order
pub fn first_entry(node: &Value) -> Option<&Value> {
    node.as_object()?.values().next()
}

/// Stable identifier for an item that arrived without one, derived from the
/// SHA-256 of its serialized payload so repeated runs reuse the same key.
pub fn fallback_external_id(raw_payload: &Value) -> String {
    let serialized = serde_json::to_string(raw_payload).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("gen-{}", &digest[..16])
}
