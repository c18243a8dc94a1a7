//! Response normalization.
//!
//! Converts structured results from the command layer into [`GenericValue`]
//! trees. Classification is purely structural:
//!
//! | Document node            | Generic value |
//! |--------------------------|---------------|
//! | number stored as integer | `Int`         |
//! | number stored as float   | `Float`       |
//! | string                   | `String`      |
//! | boolean                  | `Bool`        |
//! | object                   | `Map`, keys in encounter order |
//! | array                    | `List`        |
//! | null                     | `Null`        |
//!
//! Unsigned integers above `i64::MAX` do not fit `Int` and are carried as
//! `Float`. A number with no `f64` representation is dropped from its parent
//! map or list rather than failing the whole response.
//!
//! # Examples
//!
//! ```
//! use cardlink_bridge::normalizer::normalize;
//! use cardlink_core::GenericValue;
//! use serde_json::json;
//!
//! let value = normalize(&json!({ "health": 0, "ratio": 0.5, "tags": ["a"] }));
//! assert_eq!(value.get("health"), Some(&GenericValue::Int(0)));
//! assert_eq!(value.get("ratio"), Some(&GenericValue::Float(0.5)));
//! ```

use cardlink_core::{GenericValue, ValueMap};
use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::{BridgeError, Result};

/// Normalize a structured document.
///
/// Total and deterministic; never fails.
pub fn normalize(document: &Value) -> GenericValue {
    classify(document).unwrap_or(GenericValue::Null)
}

/// Serialize a typed response and normalize it.
///
/// # Errors
///
/// Returns [`BridgeError::Malformed`] if the response cannot be represented as
/// a structured document (e.g. a map with non-string keys).
pub fn normalize_response<T: Serialize + ?Sized>(response: &T) -> Result<GenericValue> {
    let document = serde_json::to_value(response)
        .map_err(|e| BridgeError::malformed("Response is not a structured document", e))?;
    Ok(normalize(&document))
}

/// Parse a pre-serialized JSON document and normalize it.
///
/// # Errors
///
/// Returns [`BridgeError::Malformed`] if `text` is not valid JSON.
pub fn normalize_document(text: &str) -> Result<GenericValue> {
    let document: Value = serde_json::from_str(text)
        .map_err(|e| BridgeError::malformed("Response document does not parse", e))?;
    Ok(normalize(&document))
}

fn classify(node: &Value) -> Option<GenericValue> {
    match node {
        Value::Null => Some(GenericValue::Null),
        Value::Bool(b) => Some(GenericValue::Bool(*b)),
        Value::Number(n) => classify_number(n),
        Value::String(s) => Some(GenericValue::String(s.clone())),
        Value::Array(items) => Some(GenericValue::List(
            items.iter().filter_map(classify).collect(),
        )),
        Value::Object(entries) => Some(GenericValue::Map(
            entries
                .iter()
                .filter_map(|(key, value)| classify(value).map(|v| (key.clone(), v)))
                .collect::<ValueMap>(),
        )),
    }
}

fn classify_number(number: &Number) -> Option<GenericValue> {
    if let Some(i) = number.as_i64() {
        return Some(GenericValue::Int(i));
    }
    // u64 beyond i64::MAX, or a float
    number.as_f64().map(GenericValue::Float)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(normalize(&json!(null)), GenericValue::Null);
        assert_eq!(normalize(&json!(true)), GenericValue::Bool(true));
        assert_eq!(normalize(&json!(-3)), GenericValue::Int(-3));
        assert_eq!(normalize(&json!(1.25)), GenericValue::Float(1.25));
        assert_eq!(normalize(&json!("hi")), GenericValue::from("hi"));
    }

    #[test]
    fn test_float_typed_integral_value_stays_float() {
        let value = normalize_document("{\"a\": 2.0, \"b\": 2}").unwrap();
        assert_eq!(value.get("a"), Some(&GenericValue::Float(2.0)));
        assert_eq!(value.get("b"), Some(&GenericValue::Int(2)));
    }

    #[test]
    fn test_large_unsigned_becomes_float() {
        let value = normalize(&json!(u64::MAX));
        assert_eq!(value, GenericValue::Float(u64::MAX as f64));
    }

    #[test]
    fn test_nested_structure() {
        let value = normalize(&json!({
            "cardId": "CB79",
            "settings": { "mask": ["AllowSetPIN1", "AllowSetPIN2"], "max": 10 },
            "wallet": null,
            "history": [[1, 2.5], {"x": false}],
        }));

        let settings = value.get("settings").unwrap();
        assert_eq!(
            settings.get("mask"),
            Some(&GenericValue::List(vec![
                GenericValue::from("AllowSetPIN1"),
                GenericValue::from("AllowSetPIN2"),
            ]))
        );
        assert_eq!(value.get("wallet"), Some(&GenericValue::Null));

        let history = value.get("history").and_then(GenericValue::as_list).unwrap();
        assert_eq!(
            history[0],
            GenericValue::List(vec![GenericValue::Int(1), GenericValue::Float(2.5)])
        );
        assert_eq!(history[1].get("x"), Some(&GenericValue::Bool(false)));
    }

    #[test]
    fn test_document_preserves_key_order() {
        let value = normalize_document(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        let keys: Vec<&str> = value
            .as_map()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_document_scalar_root() {
        assert_eq!(normalize_document("42").unwrap(), GenericValue::Int(42));
    }

    #[test]
    fn test_malformed_document() {
        let error = normalize_document("{\"cardId\": ").unwrap_err();
        assert!(matches!(error, BridgeError::Malformed { cause: Some(_), .. }));
    }

    #[test]
    fn test_normalize_response_typed() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            card_id: String,
            signed_hashes: u32,
            remaining: Option<f32>,
        }

        let value = normalize_response(&Response {
            card_id: "AA".to_string(),
            signed_hashes: 3,
            remaining: None,
        })
        .unwrap();

        assert_eq!(value.get("cardId"), Some(&GenericValue::from("AA")));
        assert_eq!(value.get("signedHashes"), Some(&GenericValue::Int(3)));
        assert_eq!(value.get("remaining"), Some(&GenericValue::Null));
    }

    #[test]
    fn test_normalize_response_rejects_non_string_keys() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(vec![1u8], 1);
        assert!(matches!(
            normalize_response(&map),
            Err(BridgeError::Malformed { .. })
        ));
    }

    #[test]
    fn test_deterministic() {
        let document = json!({"a": [1, 2.5, "x", null, {"b": true}]});
        assert_eq!(normalize(&document), normalize(&document));
    }

    fn arb_document() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            (-1.0e12f64..1.0e12f64)
                .prop_filter("fractional", |f| f.fract() != 0.0)
                .prop_map(Value::from),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::vec(("[a-z]{1,6}", inner), 0..6).prop_map(|entries| {
                    Value::Object(entries.into_iter().collect())
                }),
            ]
        })
    }

    proptest! {
        /// Normalizing then converting back yields the original document.
        #[test]
        fn prop_roundtrip_is_fixed_point(document in arb_document()) {
            let value = normalize(&document);
            prop_assert_eq!(value.to_json(), document.clone());
            prop_assert_eq!(normalize(&value.to_json()), value);
        }
    }
}
