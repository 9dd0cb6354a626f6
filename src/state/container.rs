// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::{NodeError, SchemaError};
use crate::state::StateSchema;

/// Partial state: the subset of fields a node (or a caller) provides.
///
/// Used both as the initial state of an invocation and as the update a node
/// returns. Nothing is checked until the update reaches a merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    values: BTreeMap<String, Value>,
}

pub type PartialState = StateUpdate;

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Set a field from any serializable value
    pub fn set_serialized<T: Serialize>(
        self,
        field: impl Into<String>,
        value: &T,
    ) -> Result<Self, NodeError> {
        let field = field.into();
        let value = serde_json::to_value(value).map_err(|source| NodeError::Serialization {
            field: field.clone(),
            source,
        })?;
        Ok(self.set(field, value))
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for StateUpdate {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for StateUpdate {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// The state of one graph invocation.
///
/// Holds only declared fields; a field that was never written is absent,
/// not null. Owned exclusively by the engine while an invocation runs.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    values: BTreeMap<String, Value>,
}

pub type FinalState = State;

impl State {
    pub fn empty() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Seed a state from an initial partial state, checking every field
    /// against the schema.
    pub fn from_initial(schema: &StateSchema, initial: StateUpdate) -> Result<Self, SchemaError> {
        let mut values = BTreeMap::new();
        for (field, value) in initial {
            schema.check_value(&field, &value)?;
            values.insert(field, value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Immutable view for node functions
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            values: Arc::new(self.values.clone()),
        }
    }

    pub fn get_as<T: DeserializeOwned>(&self, field: &str) -> Option<T> {
        self.values
            .get(field)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub(crate) fn set(&mut self, field: String, value: Value) {
        self.values.insert(field, value);
    }
}

/// Read-only view of a state, taken once per step.
///
/// Every node dispatched in the same step gets a clone of the same snapshot,
/// so no node ever sees a sibling's write before the step is merged.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    values: Arc<BTreeMap<String, Value>>,
}

impl StateSnapshot {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Field value, or `MissingField` when absent
    pub fn require(&self, field: &str) -> Result<&Value, NodeError> {
        self.values.get(field).ok_or_else(|| NodeError::MissingField {
            field: field.to_string(),
        })
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    pub fn get_sequence(&self, field: &str) -> Option<&[Value]> {
        self.get(field).and_then(Value::as_array).map(Vec::as_slice)
    }

    /// Deserialize a required field into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, field: &str) -> Result<T, NodeError> {
        let value = self.require(field)?;
        serde_json::from_value(value.clone()).map_err(|source| NodeError::Serialization {
            field: field.to_string(),
            source,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}
