// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-field reducers applied at the end of each step.
//!
//! All updates produced by the nodes of one step are merged together. For a
//! `Combine` field the result is the current value combined with every
//! writer's value (absent writers contribute the identity). For an
//! `Overwrite` field a single writer replaces the value; several writers are
//! a conflict, surfaced as [`MergeConflictError`] in [`MergeMode::Strict`] or
//! resolved by application order in [`MergeMode::LastWriterWins`].
//!
//! A merge is atomic: the new values are computed first and committed only
//! when every field merged cleanly.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::{ExecutionError, MergeConflictError};
use crate::observability::messages::merge::{OverwriteHazard, StepMerged};
use crate::observability::messages::StructuredLog;
use crate::state::{FieldKind, FieldSpec, Reducer, State, StateSchema, StateUpdate};

/// What the merger does when an `Overwrite` field has several writers in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Fail the step with a `MergeConflictError`
    #[default]
    Strict,
    /// Keep the value applied last. Which writer that is depends on the order
    /// updates reach the merger, so callers relying on it accept the hazard.
    LastWriterWins,
}

pub struct StateMerger<'a> {
    schema: &'a StateSchema,
    mode: MergeMode,
}

impl<'a> StateMerger<'a> {
    pub fn new(schema: &'a StateSchema, mode: MergeMode) -> Self {
        Self { schema, mode }
    }

    /// Merge a single writer's update.
    pub fn apply(
        &self,
        state: &mut State,
        writer: &str,
        update: StateUpdate,
    ) -> Result<(), ExecutionError> {
        self.apply_step(state, vec![(writer.to_string(), update)])
    }

    /// Merge every update produced in one step, in the order given.
    pub fn apply_step(
        &self,
        state: &mut State,
        updates: Vec<(String, StateUpdate)>,
    ) -> Result<(), ExecutionError> {
        let update_count = updates.len();
        let mut writes: BTreeMap<String, Vec<(String, Value)>> = BTreeMap::new();

        for (writer, update) in updates {
            for (field, value) in update {
                self.schema.check_value(&field, &value)?;
                writes.entry(field).or_default().push((writer.clone(), value));
            }
        }

        let mut merged = Vec::with_capacity(writes.len());
        for (field, field_writes) in writes {
            let field_spec = self.schema.require(&field)?;
            let value = match field_spec.reducer {
                Reducer::Overwrite => self.overwrite(&field, field_writes)?,
                Reducer::Combine => combine(&field, field_spec, state.get(&field), field_writes)?,
            };
            merged.push((field, value));
        }

        StepMerged {
            update_count,
            field_count: merged.len(),
        }
        .log();

        for (field, value) in merged {
            state.set(field, value);
        }
        Ok(())
    }

    fn overwrite(
        &self,
        field: &str,
        mut writes: Vec<(String, Value)>,
    ) -> Result<Value, ExecutionError> {
        if writes.len() > 1 {
            let writers: Vec<String> = writes.iter().map(|(w, _)| w.clone()).collect();
            match self.mode {
                MergeMode::Strict => {
                    return Err(MergeConflictError {
                        field: field.to_string(),
                        writers,
                    }
                    .into());
                }
                MergeMode::LastWriterWins => {
                    let winner = writers.last().map(String::as_str).unwrap_or_default();
                    OverwriteHazard {
                        field,
                        writers: &writers,
                        winner,
                    }
                    .log();
                }
            }
        }

        writes
            .pop()
            .map(|(_, value)| value)
            .ok_or_else(|| ExecutionError::Internal {
                message: format!("merge of field '{}' had no writers", field),
            })
    }
}

fn combine(
    field: &str,
    field_spec: &FieldSpec,
    current: Option<&Value>,
    writes: Vec<(String, Value)>,
) -> Result<Value, ExecutionError> {
    let start = current.cloned().unwrap_or_else(|| field_spec.identity());

    match field_spec.kind {
        FieldKind::Sequence => {
            let mut items = match start {
                Value::Array(items) => items,
                other => vec![other],
            };
            for (_, value) in writes {
                match value {
                    Value::Array(more) => items.extend(more),
                    other => items.push(other),
                }
            }
            Ok(Value::Array(items))
        }
        FieldKind::Integer => {
            let mut total = start.as_i64().ok_or_else(|| ExecutionError::Internal {
                message: format!("field '{}' holds a non-integer value", field),
            })?;
            for (writer, value) in writes {
                let addend = value.as_i64().ok_or_else(|| ExecutionError::Internal {
                    message: format!(
                        "field '{}' received a non-integer value from '{}'",
                        field, writer
                    ),
                })?;
                total = total
                    .checked_add(addend)
                    .ok_or_else(|| ExecutionError::Internal {
                        message: format!(
                            "integer overflow combining field '{}' with value from '{}'",
                            field, writer
                        ),
                    })?;
            }
            Ok(Value::from(total))
        }
        kind => Err(ExecutionError::Internal {
            message: format!("field '{}' of kind {} cannot be combined", field, kind),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SchemaError;
    use serde_json::json;

    fn schema() -> StateSchema {
        StateSchema::new("merge")
            .declare("report", FieldKind::Text, Reducer::Overwrite)
            .unwrap()
            .declare("processed_logs", FieldKind::Sequence, Reducer::Combine)
            .unwrap()
            .declare("count", FieldKind::Integer, Reducer::Combine)
            .unwrap()
    }

    fn update(pairs: &[(&str, Value)]) -> StateUpdate {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn as_sorted_strings(value: &Value) -> Vec<String> {
        let mut items: Vec<String> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        items.sort();
        items
    }

    #[test]
    fn test_single_overwrite_sets_value() {
        let schema = schema();
        let merger = StateMerger::new(&schema, MergeMode::Strict);
        let mut state = State::empty();

        merger
            .apply(&mut state, "a", update(&[("report", json!("first"))]))
            .unwrap();
        merger
            .apply(&mut state, "b", update(&[("report", json!("second"))]))
            .unwrap();

        assert_eq!(state.get("report"), Some(&json!("second")));
    }

    #[test]
    fn test_combine_is_order_insensitive() {
        let schema = schema();
        let merger = StateMerger::new(&schema, MergeMode::Strict);

        let a = ("a".to_string(), update(&[("processed_logs", json!(["x"]))]));
        let b = ("b".to_string(), update(&[("processed_logs", json!(["y"]))]));

        let mut forward = State::empty();
        merger
            .apply_step(&mut forward, vec![a.clone(), b.clone()])
            .unwrap();
        let mut backward = State::empty();
        merger.apply_step(&mut backward, vec![b, a]).unwrap();

        let forward = as_sorted_strings(forward.get("processed_logs").unwrap());
        let backward = as_sorted_strings(backward.get("processed_logs").unwrap());
        assert_eq!(forward, vec!["x", "y"]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_combine_extends_current_value() {
        let schema = schema();
        let merger = StateMerger::new(&schema, MergeMode::Strict);
        let mut state = State::from_initial(
            &schema,
            update(&[("processed_logs", json!(["seed"])), ("count", json!(1))]),
        )
        .unwrap();

        merger
            .apply_step(
                &mut state,
                vec![
                    ("a".to_string(), update(&[("processed_logs", json!(["x"])), ("count", json!(2))])),
                    ("b".to_string(), update(&[("count", json!(4))])),
                ],
            )
            .unwrap();

        assert_eq!(state.get("processed_logs"), Some(&json!(["seed", "x"])));
        assert_eq!(state.get("count"), Some(&json!(7)));
    }

    #[test]
    fn test_strict_mode_rejects_shared_overwrite() {
        let schema = schema();
        let merger = StateMerger::new(&schema, MergeMode::Strict);
        let mut state = State::empty();

        let err = merger
            .apply_step(
                &mut state,
                vec![
                    ("a".to_string(), update(&[("report", json!("a")), ("processed_logs", json!(["a"]))])),
                    ("b".to_string(), update(&[("report", json!("b"))])),
                ],
            )
            .unwrap_err();

        match err {
            ExecutionError::MergeConflict(conflict) => {
                assert_eq!(conflict.field, "report");
                assert_eq!(conflict.writers, vec!["a", "b"]);
            }
            other => panic!("expected merge conflict, got {other:?}"),
        }
        // the failed step left nothing behind
        assert!(state.is_empty());
    }

    #[test]
    fn test_last_writer_wins_keeps_final_value() {
        let schema = schema();
        let merger = StateMerger::new(&schema, MergeMode::LastWriterWins);
        let mut state = State::empty();

        merger
            .apply_step(
                &mut state,
                vec![
                    ("a".to_string(), update(&[("report", json!("a"))])),
                    ("b".to_string(), update(&[("report", json!("b"))])),
                ],
            )
            .unwrap();

        assert_eq!(state.get("report"), Some(&json!("b")));
    }

    #[test]
    fn test_undeclared_field_is_schema_error() {
        let schema = schema();
        let merger = StateMerger::new(&schema, MergeMode::Strict);
        let mut state = State::empty();

        let err = merger
            .apply(&mut state, "a", update(&[("qs_summary", json!("x"))]))
            .unwrap_err();

        assert!(matches!(
            err,
            ExecutionError::Schema(SchemaError::UndeclaredField { ref field, .. }) if field == "qs_summary"
        ));
    }

    #[test]
    fn test_wrong_kind_is_schema_error() {
        let schema = schema();
        let merger = StateMerger::new(&schema, MergeMode::Strict);
        let mut state = State::empty();

        let err = merger
            .apply(&mut state, "a", update(&[("processed_logs", json!("not a list"))]))
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Schema(SchemaError::TypeMismatch { .. })));
    }

    #[test]
    fn test_combine_rejects_integer_beyond_i64() {
        let schema = schema();
        let merger = StateMerger::new(&schema, MergeMode::Strict);
        let mut state = State::empty();

        let err = merger
            .apply(&mut state, "a", update(&[("count", json!(u64::MAX))]))
            .unwrap_err();

        assert!(matches!(
            err,
            ExecutionError::Schema(SchemaError::TypeMismatch { ref field, .. }) if field == "count"
        ));
        assert!(state.get("count").is_none());
    }
}
