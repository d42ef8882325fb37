//! Deterministic cache key generation for upstream requests.
//!
//! The key is the SHA-256 of `METHOD:URL:PARAMS`, where `PARAMS` is the
//! parameter mapping serialized with object keys sorted at every depth.
//! Absent parameters serialize as an empty mapping (`{}`), so a request
//! with no parameters and one with an empty mapping share a key. Array
//! order is preserved.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Compute the cache key for a request.
pub fn compute_cache_key(method: &str, url: &str, params: Option<&Map<String, Value>>) -> String {
    let canonical = match params {
        Some(map) => canonical_object(map),
        None => "{}".to_string(),
    };

    let mut hasher = Sha256::new();
    hasher.update(method.to_uppercase().as_bytes());
    hasher.update(b":");
    hasher.update(url.as_bytes());
    hasher.update(b":");
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Serialize a JSON value with object keys sorted recursively.
///
/// Independent of whether `serde_json` was built with `preserve_order`.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn canonical_object(map: &Map<String, Value>) -> String {
    let mut out = String::new();
    write_object(map, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_object(map: &Map<String, Value>, out: &mut String) {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(value, out);
    }
    out.push('}');
}
