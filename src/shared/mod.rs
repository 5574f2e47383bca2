//! Shared helpers used across the SDK: key casing and emptiness.

pub mod case;

use serde_json::Value;

/// Whether a value carries nothing worth looking at.
///
/// `null` is empty; strings and arrays are empty at length zero; objects are
/// empty without keys. Numbers and booleans are never empty, so `0` and
/// `false` count as content.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Recursively drop every empty-valued key from objects.
///
/// Array elements are cleaned but never removed, so positions are stable.
pub fn remove_empty(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(remove_empty).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !is_empty(v))
                .map(|(k, v)| (k, remove_empty(v)))
                .collect(),
        ),
        scalar => scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_empty() {
        assert!(is_empty(&Value::Null));
        assert!(is_empty(&json!("")));
        assert!(is_empty(&json!([])));
        assert!(is_empty(&json!({})));
        assert!(!is_empty(&json!(0)));
        assert!(!is_empty(&json!(false)));
        assert!(!is_empty(&json!(" ")));
        assert!(!is_empty(&json!([null])));
        assert!(!is_empty(&json!({ "a": null })));
    }

    #[test]
    fn test_remove_empty_recurses_into_objects() {
        let cleaned = remove_empty(json!({
            "keep": 0,
            "drop": "",
            "nested": { "gone": null, "kept": false, "inner": { "x": [] } },
            "list": [{ "a": "", "b": 1 }, ""],
        }));
        assert_eq!(
            cleaned,
            json!({
                "keep": 0,
                "nested": { "kept": false, "inner": {} },
                "list": [{ "b": 1 }, ""],
            })
        );
    }
}
