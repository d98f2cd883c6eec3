//! Stable JSON rendering for metadata documents and model artifacts.
//!
//! Values are routed through `serde_json::Value`. Its object map is a
//! `BTreeMap` (the `preserve_order` feature stays off), so struct fields and
//! map entries come out sorted by key at every level. Model artifacts are
//! identified by a hash over these bytes, so two fits of the same model must
//! print identically.

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer};

/// Render `value` as two-space indented JSON with sorted keys and a
/// trailing newline.
pub fn to_canonical_vec<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let tree = serde_json::to_value(value)?;

    let mut out = Vec::with_capacity(512);
    {
        let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"  "));
        tree.serialize(&mut serializer)?;
    }
    out.push(b'\n');
    Ok(out)
}

/// [`to_canonical_vec`], as a `String`
pub fn canonical_json_string<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let bytes = to_canonical_vec(value)?;
    // serde_json only emits UTF-8
    String::from_utf8(bytes).map_err(serde::ser::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Unordered {
        zeta: u8,
        alpha: BTreeMap<String, u8>,
    }

    #[test]
    fn struct_fields_are_sorted() {
        let value = Unordered {
            zeta: 1,
            alpha: BTreeMap::from([("b".to_string(), 2), ("a".to_string(), 1)]),
        };
        let out = canonical_json_string(&value).unwrap();

        assert!(out.find("\"alpha\"").unwrap() < out.find("\"zeta\"").unwrap());
        assert!(out.find("\"a\"").unwrap() < out.find("\"b\"").unwrap());
    }

    #[test]
    fn layout_is_fixed() {
        let value = json!({"scores": {"r2": {"cv": 0.5}}, "name": "iris"});
        let expected = "{\n  \"name\": \"iris\",\n  \"scores\": {\n    \"r2\": {\n      \"cv\": 0.5\n    }\n  }\n}\n";
        assert_eq!(canonical_json_string(&value).unwrap(), expected);
    }
}
