//! Deterministic JSON canonicalization.
//!
//! Payloads that end up inside a hash must encode to the same bytes every
//! time. `serde_json`'s default `Map` is ordered by key, but values built
//! elsewhere (or deserialized with different features) may not be, so the
//! canonical form is produced by recursively rebuilding every object with
//! sorted keys before serializing.

use serde_json::Value;
use std::collections::BTreeMap;

/// Render a JSON value in canonical form: object keys recursively sorted,
/// no insignificant whitespace.
///
/// Numbers are emitted as `serde_json` parses them; callers that need
/// byte-stable hashing must avoid floating-point values in hashed payloads.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        },
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted() {
        let value = json!({"zulu": 1, "alpha": 2, "mike": 3});
        assert_eq!(canonical_json(&value), r#"{"alpha":2,"mike":3,"zulu":1}"#);
    }

    #[test]
    fn test_nested_objects_sorted() {
        let value = json!({"outer": {"b": 1, "a": {"d": 4, "c": 3}}});
        assert_eq!(
            canonical_json(&value),
            r#"{"outer":{"a":{"c":3,"d":4},"b":1}}"#
        );
    }

    #[test]
    fn test_arrays_preserve_order() {
        let value = json!({"items": [3, 1, 2]});
        assert_eq!(canonical_json(&value), r#"{"items":[3,1,2]}"#);
    }

    #[test]
    fn test_scalars_unchanged() {
        assert_eq!(canonical_json(&json!(null)), "null");
        assert_eq!(canonical_json(&json!("text")), "\"text\"");
        assert_eq!(canonical_json(&json!(42)), "42");
    }
}
