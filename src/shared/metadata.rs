//! Key-value metadata attached to context entries and dependency edges.
//!
//! Metadata is a JSON object. Most keys are free-form, a few are reserved and
//! type-checked when the map crosses the boundary:
//!
//! | key         | type                         |
//! |-------------|------------------------------|
//! | `author`    | string                       |
//! | `source`    | string                       |
//! | `tags`      | array of strings             |
//! | `artifacts` | object of string -> string   |
//!
//! `status` may not appear as a key; it is an argument of its own.

use crate::shared::errors::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const AUTHOR_KEY: &str = "author";
pub const SOURCE_KEY: &str = "source";
pub const TAGS_KEY: &str = "tags";
pub const ARTIFACTS_KEY: &str = "artifacts";
const FORBIDDEN_KEYS: [&str; 1] = ["status"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes metadata supplied as encoded text. Blank text is an empty map.
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| EngineError::InvalidMetadata(format!("not valid json: {err}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, EngineError> {
        match value {
            Value::Object(map) => Self::from_map(map),
            Value::Null => Ok(Self::default()),
            other => Err(EngineError::InvalidMetadata(format!(
                "expected a json object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn from_map(map: Map<String, Value>) -> Result<Self, EngineError> {
        for key in map.keys() {
            if key.trim().is_empty() {
                return Err(EngineError::InvalidMetadata(
                    "keys must be non-empty".to_string(),
                ));
            }
            if FORBIDDEN_KEYS.contains(&key.as_str()) {
                return Err(EngineError::InvalidMetadata(format!(
                    "`{key}` is reserved and cannot be set through metadata"
                )));
            }
        }
        for key in [AUTHOR_KEY, SOURCE_KEY] {
            if let Some(value) = map.get(key) {
                if !value.is_string() {
                    return Err(EngineError::InvalidMetadata(format!(
                        "`{key}` must be a string"
                    )));
                }
            }
        }
        if let Some(tags) = map.get(TAGS_KEY) {
            let valid = tags
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string));
            if !valid {
                return Err(EngineError::InvalidMetadata(
                    "`tags` must be an array of strings".to_string(),
                ));
            }
        }
        if let Some(artifacts) = map.get(ARTIFACTS_KEY) {
            let valid = artifacts
                .as_object()
                .is_some_and(|items| items.values().all(Value::is_string));
            if !valid {
                return Err(EngineError::InvalidMetadata(
                    "`artifacts` must be an object of string values".to_string(),
                ));
            }
        }
        Ok(Self(map))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn author(&self) -> Option<&str> {
        self.get(AUTHOR_KEY).and_then(Value::as_str)
    }

    pub fn source(&self) -> Option<&str> {
        self.get(SOURCE_KEY).and_then(Value::as_str)
    }

    pub fn tags(&self) -> Vec<&str> {
        self.get(TAGS_KEY)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn artifacts(&self) -> BTreeMap<String, String> {
        self.get(ARTIFACTS_KEY)
            .and_then(Value::as_object)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|(key, value)| {
                        value.as_str().map(|value| (key.clone(), value.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_text_is_empty_metadata() {
        assert!(Metadata::parse("  ").expect("blank").is_empty());
    }

    #[test]
    fn reserved_keys_are_decoded() {
        let metadata = Metadata::parse(
            r#"{"author":"dana","tags":["api","db"],"artifacts":{"plan":"docs/plan.md"},"estimate":3}"#,
        )
        .expect("parse");
        assert_eq!(metadata.author(), Some("dana"));
        assert_eq!(metadata.tags(), vec!["api", "db"]);
        assert_eq!(
            metadata.artifacts().get("plan").map(String::as_str),
            Some("docs/plan.md")
        );
        assert_eq!(metadata.get("estimate"), Some(&json!(3)));
    }

    #[test]
    fn malformed_text_is_rejected() {
        let err = Metadata::parse("{not json").expect_err("malformed");
        assert!(matches!(err, EngineError::InvalidMetadata(_)));
        let err = Metadata::parse("[1,2]").expect_err("array");
        assert!(err.to_string().contains("expected a json object, got array"));
    }

    #[test]
    fn reserved_key_types_are_enforced() {
        for raw in [
            r#"{"author":1}"#,
            r#"{"tags":"api"}"#,
            r#"{"tags":[1]}"#,
            r#"{"artifacts":{"plan":2}}"#,
            r#"{"status":"COMPLETED"}"#,
        ] {
            assert!(Metadata::parse(raw).is_err(), "{raw} should be rejected");
        }
    }
}
