//! Canonical JSON encoding — the only interop contract between validators.
//! Every `verify` in the system signs/checks the bytes produced here,
//! never a struct's default `Serialize` output.
//!
//! Canonicalization requires: UTF-8, object keys sorted lexicographically at
//! every nesting level, no insignificant whitespace, integers rendered
//! without an exponent, floats rendered to their shortest round-trippable
//! form. `serde_json::Map` is backed by a `BTreeMap` as long as the
//! `preserve_order` feature is off, so converting through `serde_json::Value`
//! and serializing compactly gives us exactly this for free — at every
//! nesting level, because `Value::Object` recurses.

use serde::Serialize;
use serde_json::Value;

use crate::error::TypesError;

/// Encodes `value` as canonical JSON bytes.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, TypesError> {
    let v = serde_json::to_value(value).map_err(TypesError::Json)?;
    canonical_bytes_from_value(&v)
}

/// Encodes an already-constructed `serde_json::Value` as canonical JSON bytes.
pub fn canonical_bytes_from_value(value: &Value) -> Result<Vec<u8>, TypesError> {
    serde_json::to_vec(value).map_err(TypesError::Json)
}

/// Convenience wrapper returning a `String` instead of bytes.
pub fn canonical_string<T: Serialize>(value: &T) -> Result<String, TypesError> {
    Ok(String::from_utf8(canonical_bytes(value)?).expect("serde_json emits valid utf-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_keys_at_every_nesting_level() {
        let v = json!({"b": 1, "a": {"z": 1, "y": 2}});
        let out = canonical_bytes_from_value(&v).unwrap();
        assert_eq!(out, br#"{"a":{"y":2,"z":1},"b":1}"#);
    }

    #[test]
    fn has_no_insignificant_whitespace() {
        let v = json!({"a": [1, 2, 3]});
        let out = String::from_utf8(canonical_bytes_from_value(&v).unwrap()).unwrap();
        assert_eq!(out, r#"{"a":[1,2,3]}"#);
    }

    #[test]
    fn round_trips_through_serialize() {
        #[derive(Serialize)]
        struct Inner {
            z: u8,
            a: u8,
        }
        #[derive(Serialize)]
        struct Outer {
            name: String,
            inner: Inner,
        }
        let out = canonical_string(&Outer {
            name: "x".into(),
            inner: Inner { z: 1, a: 2 },
        })
        .unwrap();
        assert_eq!(out, r#"{"inner":{"a":2,"z":1},"name":"x"}"#);
    }
}
