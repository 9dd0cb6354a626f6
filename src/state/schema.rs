// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Statically declared state schemas.
//!
//! A schema fixes the set of fields a graph's state may hold. Each field has a
//! semantic kind, which decides which JSON values it accepts and what its
//! default is, and a reducer, which decides how several writers in the same
//! merge step are combined.
//!
//! ```
//! use the_stategraph::state::{FieldKind, Reducer, StateSchema};
//!
//! let schema = StateSchema::new("entry")
//!     .declare("raw_logs", FieldKind::Sequence, Reducer::Overwrite)
//!     .unwrap()
//!     .declare("processed_logs", FieldKind::Sequence, Reducer::Combine)
//!     .unwrap();
//!
//! assert!(schema.contains("processed_logs"));
//! assert_eq!(schema.field_names().count(), 2);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::SchemaError;

/// Semantic type of a state field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    Boolean,
    Sequence,
    Record,
    /// Accepts any value, including `null`
    Any,
}

impl FieldKind {
    /// Value a field of this kind starts with when nothing else is declared
    pub fn default_value(&self) -> Value {
        match self {
            FieldKind::Text => Value::String(String::new()),
            FieldKind::Integer => Value::from(0),
            FieldKind::Boolean => Value::Bool(false),
            FieldKind::Sequence => Value::Array(Vec::new()),
            FieldKind::Record => Value::Object(serde_json::Map::new()),
            FieldKind::Any => Value::Null,
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::Text => value.is_string(),
            FieldKind::Integer => value.is_i64(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Sequence => value.is_array(),
            FieldKind::Record => value.is_object(),
            FieldKind::Any => true,
        }
    }

    /// Whether values of this kind can be carried into a field of `other`.
    /// `Any` on either side defers the check to run time.
    pub fn compatible_with(&self, other: FieldKind) -> bool {
        *self == other || *self == FieldKind::Any || other == FieldKind::Any
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Sequence => "sequence",
            FieldKind::Record => "record",
            FieldKind::Any => "any",
        };
        f.write_str(name)
    }
}

/// How concurrent writers of one field are combined in a merge step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    /// The written value replaces the current one
    Overwrite,
    /// Current value and every written value are combined: sequences are
    /// concatenated, integers are summed
    Combine,
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reducer::Overwrite => f.write_str("overwrite"),
            Reducer::Combine => f.write_str("combine"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub reducer: Reducer,
    default: Option<Value>,
}

impl FieldSpec {
    pub fn default_value(&self) -> Value {
        self.default
            .clone()
            .unwrap_or_else(|| self.kind.default_value())
    }

    /// Identity element of a `Combine` field
    pub(crate) fn identity(&self) -> Value {
        self.kind.default_value()
    }
}

/// Named, ordered set of field declarations for one graph's state.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSchema {
    name: String,
    fields: BTreeMap<String, FieldSpec>,
}

impl StateSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a field using its kind's default value.
    pub fn declare(
        self,
        field: impl Into<String>,
        kind: FieldKind,
        reducer: Reducer,
    ) -> Result<Self, SchemaError> {
        self.insert(field.into(), kind, reducer, None)
    }

    /// Declare a field with an explicit default value.
    pub fn declare_with_default(
        self,
        field: impl Into<String>,
        kind: FieldKind,
        reducer: Reducer,
        default: Value,
    ) -> Result<Self, SchemaError> {
        self.insert(field.into(), kind, reducer, Some(default))
    }

    fn insert(
        mut self,
        field: String,
        kind: FieldKind,
        reducer: Reducer,
        default: Option<Value>,
    ) -> Result<Self, SchemaError> {
        if self.fields.contains_key(&field) {
            return Err(SchemaError::DuplicateField {
                schema: self.name.clone(),
                field,
            });
        }
        if reducer == Reducer::Combine && !matches!(kind, FieldKind::Sequence | FieldKind::Integer)
        {
            return Err(SchemaError::UnsupportedReducer {
                field,
                kind,
                reducer,
            });
        }
        if let Some(value) = &default {
            if !kind.accepts(value) {
                return Err(SchemaError::InvalidDefault { field, kind });
            }
        }

        self.fields.insert(
            field,
            FieldSpec {
                kind,
                reducer,
                default,
            },
        );
        Ok(self)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn default_for(&self, name: &str) -> Option<Value> {
        self.fields.get(name).map(FieldSpec::default_value)
    }

    /// Look up a field, failing with `UndeclaredField` when it is missing
    pub(crate) fn require(&self, name: &str) -> Result<&FieldSpec, SchemaError> {
        self.fields
            .get(name)
            .ok_or_else(|| SchemaError::UndeclaredField {
                schema: self.name.clone(),
                field: name.to_string(),
            })
    }

    /// Check that `value` fits the declared kind of `name`
    pub(crate) fn check_value(&self, name: &str, value: &Value) -> Result<&FieldSpec, SchemaError> {
        let field_spec = self.require(name)?;
        if !field_spec.kind.accepts(value) {
            return Err(SchemaError::TypeMismatch {
                field: name.to_string(),
                expected: field_spec.kind,
                found: describe(value).to_string(),
            });
        }
        Ok(field_spec)
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(n) if !n.is_i64() => "integer out of range",
        Value::Number(_) => "integer",
        Value::String(_) => "text",
        Value::Array(_) => "sequence",
        Value::Object(_) => "record",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declared_defaults() {
        let schema = StateSchema::new("qs")
            .declare("report", FieldKind::Text, Reducer::Overwrite)
            .unwrap()
            .declare("processed_logs", FieldKind::Sequence, Reducer::Combine)
            .unwrap()
            .declare_with_default("retries", FieldKind::Integer, Reducer::Overwrite, json!(3))
            .unwrap();

        assert_eq!(schema.default_for("report"), Some(json!("")));
        assert_eq!(schema.default_for("processed_logs"), Some(json!([])));
        assert_eq!(schema.default_for("retries"), Some(json!(3)));
        assert_eq!(schema.default_for("missing"), None);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = StateSchema::new("s")
            .declare("a", FieldKind::Text, Reducer::Overwrite)
            .unwrap()
            .declare("a", FieldKind::Sequence, Reducer::Combine);

        assert!(matches!(result, Err(SchemaError::DuplicateField { .. })));
    }

    #[test]
    fn test_combine_requires_sequence_or_integer() {
        let result = StateSchema::new("s").declare("summary", FieldKind::Text, Reducer::Combine);
        assert!(matches!(
            result,
            Err(SchemaError::UnsupportedReducer { kind: FieldKind::Text, .. })
        ));

        assert!(StateSchema::new("s")
            .declare("count", FieldKind::Integer, Reducer::Combine)
            .is_ok());
    }

    #[test]
    fn test_invalid_default_rejected() {
        let result = StateSchema::new("s").declare_with_default(
            "report",
            FieldKind::Text,
            Reducer::Overwrite,
            json!(42),
        );

        assert!(matches!(result, Err(SchemaError::InvalidDefault { .. })));
    }

    #[test]
    fn test_check_value_reports_mismatch() {
        let schema = StateSchema::new("s")
            .declare("logs", FieldKind::Sequence, Reducer::Overwrite)
            .unwrap();

        assert!(schema.check_value("logs", &json!(["a"])).is_ok());

        let err = schema.check_value("logs", &json!("a")).unwrap_err();
        assert_eq!(
            err,
            SchemaError::TypeMismatch {
                field: "logs".to_string(),
                expected: FieldKind::Sequence,
                found: "text".to_string(),
            }
        );

        let err = schema.check_value("other", &json!(1)).unwrap_err();
        assert!(matches!(err, SchemaError::UndeclaredField { .. }));
    }

    #[test]
    fn test_any_accepts_null() {
        assert!(FieldKind::Any.accepts(&Value::Null));
        assert!(!FieldKind::Integer.accepts(&json!(1.5)));
        assert!(FieldKind::Integer.accepts(&json!(7)));
    }

    #[test]
    fn test_integer_rejects_values_beyond_i64() {
        let schema = StateSchema::new("s")
            .declare("count", FieldKind::Integer, Reducer::Combine)
            .unwrap();

        assert!(schema.check_value("count", &json!(i64::MAX)).is_ok());
        assert!(schema.check_value("count", &json!(i64::MIN)).is_ok());

        let err = schema.check_value("count", &json!(u64::MAX)).unwrap_err();
        assert_eq!(
            err,
            SchemaError::TypeMismatch {
                field: "count".to_string(),
                expected: FieldKind::Integer,
                found: "integer out of range".to_string(),
            }
        );
    }
}
