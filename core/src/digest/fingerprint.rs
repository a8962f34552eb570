use super::event::Event;
use super::key::sha256_hex;
use crate::error::CoreResult;
use serde::Serialize;
use serde_json::{Map, Value};

/// SHA-256 over the canonical JSON of `events`, taken in key order.
///
/// Two runs over the same input must produce the same fingerprint.
pub fn fingerprint(events: &[Event]) -> CoreResult<String> {
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(sha256_hex(&canonical_json_bytes(&sorted)?))
}

/// Compact JSON with object keys sorted at every level.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> CoreResult<Vec<u8>> {
    let v = sort_keys(serde_json::to_value(value)?);
    Ok(serde_json::to_vec(&v)?)
}

fn sort_keys(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut out = Map::new();
            for (k, vv) in entries {
                out.insert(k, sort_keys(vv));
            }
            Value::Object(out)
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_bytes_ignore_key_order() {
        let a = serde_json::json!({"b": 1, "a": {"y": 2, "x": 3}});
        let b = serde_json::json!({"a": {"x": 3, "y": 2}, "b": 1});
        assert_eq!(canonical_json_bytes(&a).unwrap(), canonical_json_bytes(&b).unwrap());
    }

    #[test]
    fn empty_digest_has_stable_fingerprint() {
        assert_eq!(fingerprint(&[]).unwrap(), sha256_hex(b"[]"));
    }
}
