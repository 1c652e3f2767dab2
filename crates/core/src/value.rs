//! Value types for the registry
//!
//! Rows and ledger entries are stored as JSON documents. An entity's
//! flattened attribute set is a `Fields` map (field name → JSON value);
//! it is what the ledger snapshots and what the diff engine compares.
//!
//! `BTreeMap` keeps field order stable so serialized snapshots are
//! deterministic.

use crate::error::{BanError, BanResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// Stored document (row body or ledger entry body)
pub type Document = serde_json::Value;

/// Flattened field-to-value mapping of one entity state
pub type Fields = BTreeMap<String, serde_json::Value>;

/// Serialize a value into a stored document
pub fn to_document<T: Serialize>(value: &T) -> BanResult<Document> {
    serde_json::to_value(value).map_err(BanError::from)
}

/// Deserialize a stored document
pub fn from_document<T: DeserializeOwned>(doc: &Document) -> BanResult<T> {
    T::deserialize(doc).map_err(BanError::from)
}

/// Flatten a serializable struct into its top-level fields
///
/// Fails with `Serialization` when the value does not serialize to a JSON
/// object (entities always do).
pub fn to_fields<T: Serialize>(value: &T) -> BanResult<Fields> {
    match to_document(value)? {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(BanError::serialization(format!(
            "expected an object, got {}",
            type_name(&other)
        ))),
    }
}

/// Rebuild a struct from flattened fields
pub fn from_fields<T: DeserializeOwned>(fields: &Fields) -> BanResult<T> {
    let map: serde_json::Map<String, serde_json::Value> =
        fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    from_document(&serde_json::Value::Object(map))
}

/// Render a field value as the string used in diffs
///
/// Strings render without quotes, `null` renders as absent (`None`),
/// every other value renders as compact JSON.
pub fn render(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        rank: Option<u32>,
    }

    #[test]
    fn test_fields_roundtrip() {
        let sample = Sample {
            name: "Rue des Pommes".into(),
            rank: Some(3),
        };
        let fields = to_fields(&sample).unwrap();
        assert_eq!(fields.get("name"), Some(&json!("Rue des Pommes")));
        let back: Sample = from_fields(&fields).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn test_to_fields_rejects_non_objects() {
        let err = to_fields(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, BanError::Serialization(_)));
    }

    #[test]
    fn test_render() {
        assert_eq!(render(&json!("A")), Some("A".to_string()));
        assert_eq!(render(&json!(84)), Some("84".to_string()));
        assert_eq!(render(&json!(true)), Some("true".to_string()));
        assert_eq!(render(&json!([1.5, 2.0])), Some("[1.5,2.0]".to_string()));
        assert_eq!(render(&json!(null)), None);
    }
}
