//! JSON merge-patch engine
//!
//! Applies a partial update document to any OCPI resource. Each resource
//! type declares a `PatchSchema`: which keys are immutable identity fields,
//! which are enumerations, which are arrays, and which are timestamps. Keys
//! not named in the schema are merged as plain JSON and left to the
//! resource's deserializer, so unknown keys from newer peers are tolerated.
//!
//! The engine is all-or-nothing: the first violation stops processing and
//! the original value is handed back untouched.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::timestamp;

/// JSON key of the timestamp every patchable resource carries
pub const LAST_UPDATED: &str = "last_updated";

/// Why a patch was rejected. `Display` is the client-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("Patching the '{label}' of {noun} is not allowed!")]
    ImmutableField {
        noun: &'static str,
        label: &'static str,
    },

    #[error("Invalid JSON merge patch of {noun}: Invalid '{label}'!")]
    InvalidEnumValue {
        noun: &'static str,
        label: &'static str,
    },

    #[error("Invalid JSON merge patch for '{field}' array of {noun}: JSON property '{field}' is not an array!")]
    InvalidArrayShape {
        noun: &'static str,
        field: &'static str,
    },

    #[error("Invalid JSON merge patch of {noun}: Invalid '{label}'!")]
    InvalidTimestamp {
        noun: &'static str,
        label: &'static str,
    },

    #[error("Invalid JSON merge patch of {noun}: The patch document must be a JSON object!")]
    NotAnObject { noun: &'static str },

    #[error("Invalid JSON merge patch of {noun}: {reason}")]
    Malformed { noun: &'static str, reason: String },
}

/// How the engine treats one top-level key
#[derive(Debug, Clone, Copy)]
pub enum FieldRule {
    /// Immutable; any patch fails
    Identity { label: &'static str },
    /// Enumerated string; `null` clears it when `nullable`
    Enum {
        label: &'static str,
        is_valid: fn(&str) -> bool,
        nullable: bool,
    },
    /// Array of enumerated strings, replaced wholesale
    EnumArray {
        label: &'static str,
        is_valid: fn(&str) -> bool,
    },
    /// Array replaced wholesale; `null` clears it
    Array,
    /// ISO-8601 timestamp; `null` clears it when `nullable`
    Timestamp { label: &'static str, nullable: bool },
}

/// Per-type patch rules
#[derive(Debug, Clone, Copy)]
pub struct PatchSchema {
    /// Resource name with article, as used in messages ("a connector")
    pub noun: &'static str,
    pub fields: &'static [(&'static str, FieldRule)],
}

impl PatchSchema {
    fn rule(&self, key: &str) -> Option<(&'static str, FieldRule)> {
        self.fields.iter().find(|(name, _)| *name == key).copied()
    }
}

/// Outcome of `try_patch`; `patched_data` is always populated
#[derive(Debug, Clone, PartialEq)]
pub struct PatchResult<T> {
    pub patched_data: T,
    pub error: Option<PatchError>,
}

impl<T> PatchResult<T> {
    pub fn success(patched_data: T) -> Self {
        Self {
            patched_data,
            error: None,
        }
    }

    pub fn failed(original: T, error: PatchError) -> Self {
        Self {
            patched_data: original,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Client-visible failure message
    pub fn error_response(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub fn into_result(self) -> Result<T, PatchError> {
        match self.error {
            None => Ok(self.patched_data),
            Some(error) => Err(error),
        }
    }
}

/// A resource the merge-patch engine can update
pub trait Patchable: Serialize + DeserializeOwned + Clone {
    const SCHEMA: PatchSchema;

    fn last_updated(&self) -> DateTime<Utc>;

    /// Apply a JSON merge patch; see the module docs for the rules
    fn try_patch(&self, patch: &Value) -> PatchResult<Self> {
        try_patch(self, patch)
    }
}

/// Apply `patch` to `original` under `T::SCHEMA`
pub fn try_patch<T: Patchable>(original: &T, patch: &Value) -> PatchResult<T> {
    match apply(original, patch) {
        Ok(patched) => PatchResult::success(patched),
        Err(error) => PatchResult::failed(original.clone(), error),
    }
}

fn apply<T: Patchable>(original: &T, patch: &Value) -> Result<T, PatchError> {
    let schema = T::SCHEMA;
    let noun = schema.noun;

    let patch = patch
        .as_object()
        .ok_or(PatchError::NotAnObject { noun })?;

    let mut document = match serde_json::to_value(original) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(PatchError::Malformed {
                noun,
                reason: "resource is not a JSON object".to_string(),
            })
        }
        Err(e) => {
            return Err(PatchError::Malformed {
                noun,
                reason: e.to_string(),
            })
        }
    };

    for (key, value) in patch {
        match schema.rule(key) {
            Some((field, rule)) => apply_rule(&mut document, noun, field, rule, value)?,
            None => merge_key(&mut document, key, value),
        }
    }

    if !patch.contains_key(LAST_UPDATED) {
        document.insert(
            LAST_UPDATED.to_string(),
            Value::String(timestamp::format(&timestamp::now())),
        );
    }

    serde_json::from_value(Value::Object(document)).map_err(|e| PatchError::Malformed {
        noun,
        reason: e.to_string(),
    })
}

fn apply_rule(
    document: &mut Map<String, Value>,
    noun: &'static str,
    key: &'static str,
    rule: FieldRule,
    value: &Value,
) -> Result<(), PatchError> {
    match rule {
        FieldRule::Identity { label } => Err(PatchError::ImmutableField { noun, label }),

        FieldRule::Enum {
            label,
            is_valid,
            nullable,
        } => match value {
            Value::String(text) if is_valid(text) => {
                document.insert(key.to_string(), value.clone());
                Ok(())
            }
            Value::Null if nullable => {
                document.remove(key);
                Ok(())
            }
            _ => Err(PatchError::InvalidEnumValue { noun, label }),
        },

        FieldRule::EnumArray { label, is_valid } => match value {
            Value::Array(items) => {
                let valid = items
                    .iter()
                    .all(|item| item.as_str().map(is_valid).unwrap_or(false));
                if !valid {
                    return Err(PatchError::InvalidEnumValue { noun, label });
                }
                document.insert(key.to_string(), value.clone());
                Ok(())
            }
            Value::Null => {
                document.remove(key);
                Ok(())
            }
            _ => Err(PatchError::InvalidArrayShape { noun, field: key }),
        },

        FieldRule::Array => match value {
            Value::Array(_) => {
                document.insert(key.to_string(), value.clone());
                Ok(())
            }
            Value::Null => {
                document.remove(key);
                Ok(())
            }
            _ => Err(PatchError::InvalidArrayShape { noun, field: key }),
        },

        FieldRule::Timestamp { label, nullable } => match value {
            Value::String(text) => {
                let parsed =
                    timestamp::parse(text).ok_or(PatchError::InvalidTimestamp { noun, label })?;
                document.insert(key.to_string(), Value::String(timestamp::format(&parsed)));
                Ok(())
            }
            Value::Null if nullable => {
                document.remove(key);
                Ok(())
            }
            _ => Err(PatchError::InvalidTimestamp { noun, label }),
        },
    }
}

/// RFC 7396 merge for keys without a rule
fn merge_key(document: &mut Map<String, Value>, key: &str, value: &Value) {
    match value {
        Value::Null => {
            document.remove(key);
        }
        Value::Object(patch) => {
            let target = document
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(target) = target {
                for (child_key, child_value) in patch {
                    merge_key(target, child_key, child_value);
                }
            }
        }
        other => {
            document.insert(key.to_string(), other.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: String,
        colour: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tags: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dimensions: Option<Dimensions>,
        #[serde(with = "crate::timestamp")]
        last_updated: DateTime<Utc>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Dimensions {
        width: u32,
        height: u32,
    }

    fn is_colour(text: &str) -> bool {
        matches!(text, "RED" | "GREEN")
    }

    impl Patchable for Widget {
        const SCHEMA: PatchSchema = PatchSchema {
            noun: "a widget",
            fields: &[
                ("id", FieldRule::Identity { label: "identification" }),
                (
                    "colour",
                    FieldRule::Enum {
                        label: "widget colour",
                        is_valid: is_colour,
                        nullable: false,
                    },
                ),
                ("tags", FieldRule::Array),
                (
                    LAST_UPDATED,
                    FieldRule::Timestamp {
                        label: "last updated",
                        nullable: false,
                    },
                ),
            ],
        };

        fn last_updated(&self) -> DateTime<Utc> {
            self.last_updated
        }
    }

    fn widget() -> Widget {
        Widget {
            id: "w1".to_string(),
            colour: "RED".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
            note: Some("fragile".to_string()),
            dimensions: Some(Dimensions {
                width: 3,
                height: 4,
            }),
            last_updated: timestamp::parse("2020-01-01T00:00:00Z").unwrap(),
        }
    }

    #[test]
    fn test_first_error_wins_in_document_order() {
        let result = widget().try_patch(&json!({"colour": "BLUE", "id": "w2"}));
        assert_eq!(
            result.error_response().as_deref(),
            Some("Invalid JSON merge patch of a widget: Invalid 'widget colour'!")
        );
        assert_eq!(result.patched_data, widget());
    }

    #[test]
    fn test_null_clears_optional_scalar_and_array() {
        let result = widget().try_patch(&json!({"note": null, "tags": null}));
        assert!(result.is_success());
        assert_eq!(result.patched_data.note, None);
        assert!(result.patched_data.tags.is_empty());
    }

    #[test]
    fn test_array_replaces_wholesale() {
        let patched = widget()
            .try_patch(&json!({"tags": ["c"]}))
            .into_result()
            .unwrap();
        assert_eq!(patched.tags, vec!["c".to_string()]);
    }

    #[test]
    fn test_non_array_for_array_field() {
        let result = widget().try_patch(&json!({"tags": "c"}));
        assert_eq!(
            result.error,
            Some(PatchError::InvalidArrayShape {
                noun: "a widget",
                field: "tags"
            })
        );
        assert_eq!(
            result.error_response().as_deref(),
            Some("Invalid JSON merge patch for 'tags' array of a widget: JSON property 'tags' is not an array!")
        );
    }

    #[test]
    fn test_nested_objects_merge_recursively() {
        let patched = widget()
            .try_patch(&json!({"dimensions": {"height": 10}}))
            .into_result()
            .unwrap();
        assert_eq!(
            patched.dimensions,
            Some(Dimensions {
                width: 3,
                height: 10
            })
        );
    }

    #[test]
    fn test_unknown_keys_are_tolerated() {
        let result = widget().try_patch(&json!({"sparkles": true}));
        assert!(result.is_success());
    }

    #[test]
    fn test_patch_must_be_object() {
        let result = widget().try_patch(&json!(["colour", "GREEN"]));
        assert!(matches!(result.error, Some(PatchError::NotAnObject { .. })));
        assert_eq!(result.patched_data, widget());
    }

    #[test]
    fn test_type_errors_surface_as_malformed() {
        let result = widget().try_patch(&json!({"dimensions": {"width": "wide"}}));
        assert!(matches!(result.error, Some(PatchError::Malformed { .. })));
        assert_eq!(result.patched_data, widget());
    }

    #[test]
    fn test_empty_patch_only_touches_timestamp() {
        let before = widget();
        let patched = before.try_patch(&json!({})).into_result().unwrap();
        assert_eq!(patched.colour, before.colour);
        assert!(patched.last_updated > before.last_updated);
    }
}
