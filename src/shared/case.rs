//! Key casing between the caller convention (`startingAfter`) and the wire
//! convention (`starting_after`).
//!
//! Both directions walk a [`Value`] as one of three shapes: scalar (passed
//! through), sequence (each element rewritten, order kept) or mapping (each key
//! renamed, each value rewritten). Nothing else about the value is touched.

use serde_json::{Map, Value};

/// Rewrite every mapping key from caller convention to wire convention.
pub fn encode(value: Value) -> Value {
    rekey(value, &to_snake_case)
}

/// Rewrite every mapping key from wire convention to caller convention.
pub fn decode(value: Value) -> Value {
    rekey(value, &to_camel_case)
}

fn rekey(value: Value, rename: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(|v| rekey(v, rename)).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (rename(&k), rekey(v, rename)))
                .collect::<Map<String, Value>>(),
        ),
        scalar => scalar,
    }
}

/// `helpUrl` → `help_url`, `line1Address` → `line1_address`, `HTMLBody` → `html_body`.
///
/// Keys already in wire convention come back unchanged.
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' {
            out.push('_');
            continue;
        }
        if !c.is_uppercase() {
            out.push(c);
            continue;
        }

        let boundary = match i.checked_sub(1).map(|j| chars[j]) {
            Some(prev) if prev.is_lowercase() || prev.is_ascii_digit() => true,
            // end of an acronym: the `B` in `HTMLBody`
            Some(prev) if prev.is_uppercase() => {
                chars.get(i + 1).is_some_and(|next| next.is_lowercase())
            }
            _ => false,
        };
        if boundary && !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// `help_url` → `helpUrl`, `ID` → `id`.
///
/// Leading underscores are kept so `_id` survives a round trip.
pub fn to_camel_case(key: &str) -> String {
    let body = key.trim_start_matches('_');
    let mut out = String::with_capacity(key.len());
    out.push_str(&key[..key.len() - body.len()]);

    let words = body
        .split(|c: char| c == '_' || c == '-' || c == ' ')
        .filter(|w| !w.is_empty());

    for (i, word) in words.enumerate() {
        let shouting = !word.chars().any(char::is_lowercase);
        let mut chars = word.chars();
        let Some(first) = chars.next() else { continue };

        if i == 0 {
            out.extend(first.to_lowercase());
        } else {
            out.extend(first.to_uppercase());
        }
        if shouting {
            out.extend(chars.flat_map(char::to_lowercase));
        } else {
            out.extend(chars);
        }
    }

    out
}
