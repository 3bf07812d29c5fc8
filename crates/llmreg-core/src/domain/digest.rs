//! Canonical JSON and SHA-256 digests for suites.
//!
//! Two suites with the same cases in the same order hash identically no
//! matter how their source files order object keys.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::error::Result;

/// Recursively rebuild objects with keys in UTF-16 code unit order.
fn sort_keys(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));

            let mut sorted = serde_json::Map::new();
            for key in keys {
                if let Some(v) = map.get(key) {
                    sorted.insert(key.clone(), sort_keys(v));
                }
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(sort_keys).collect())
        }
        other => other.clone(),
    }
}

/// Compact JSON with sorted keys.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&sort_keys(&value))?)
}

/// SHA-256 hex digest of the canonical JSON form of `value`.
pub fn compute_digest<T: Serialize>(value: &T) -> Result<String> {
    let canonical = canonical_json(value)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let input = json!({"b": {"y": 1, "x": 2}, "a": [ {"d": 0, "c": 1} ]});
        let canonical = canonical_json(&input).unwrap();
        assert_eq!(canonical, r#"{"a":[{"c":1,"d":0}],"b":{"x":2,"y":1}}"#);
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = compute_digest(&json!({"k": "v"})).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_digest_ignores_key_order_but_not_array_order() {
        let a = compute_digest(&json!({"x": 1, "y": 2})).unwrap();
        let b = compute_digest(&json!({"y": 2, "x": 1})).unwrap();
        assert_eq!(a, b);

        let c = compute_digest(&json!([1, 2])).unwrap();
        let d = compute_digest(&json!([2, 1])).unwrap();
        assert_ne!(c, d);
    }
}
