use crate::shared::serde_ext::parse_via_string;
use serde::{Deserialize, Deserializer, Serialize};

const MAX_IDENTIFIER_LEN: usize = 128;

/// Identifiers double as file names in the JSON store, so they are limited to
/// ASCII letters, digits, `-` and `_`.
pub fn validate_identifier_value(kind: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{kind} must be non-empty"));
    }
    if value.len() > MAX_IDENTIFIER_LEN {
        return Err(format!(
            "{kind} must be at most {MAX_IDENTIFIER_LEN} characters"
        ));
    }
    if value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Ok(());
    }
    Err(format!(
        "{kind} must use only ASCII letters, digits, '-' or '_'"
    ))
}

macro_rules! define_id_type {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub const KIND: &'static str = $kind;

            pub fn parse(raw: &str) -> Result<Self, String> {
                validate_identifier_value($kind, raw)?;
                Ok(Self(raw.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                parse_via_string(deserializer, $kind, Self::parse)
            }
        }
    };
}

define_id_type!(TaskId, "task id");
define_id_type!(WorkflowId, "workflow id");
define_id_type!(SubagentId, "subagent id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_style_task_ids_are_accepted() {
        for raw in ["AL-1", "ENG-1234", "task_42"] {
            TaskId::parse(raw).expect("valid task id");
        }
    }

    #[test]
    fn path_like_and_blank_ids_are_rejected() {
        for raw in ["", "../etc", "a/b", "with space", ".hidden"] {
            let err = TaskId::parse(raw).expect_err("invalid task id");
            assert!(err.starts_with("task id must"), "unexpected message: {err}");
        }
        let long = "x".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(WorkflowId::parse(&long).is_err());
    }

    #[test]
    fn deserialization_reports_kind_and_value() {
        let err = serde_json::from_str::<WorkflowId>("\"bad id\"").expect_err("invalid");
        assert!(err.to_string().contains("invalid workflow id `bad id`"));
    }
}
