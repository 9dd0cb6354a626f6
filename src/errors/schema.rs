// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised when a state value or declaration does not fit a schema.

use crate::state::{FieldKind, Reducer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// A node or an initial state wrote a field the schema never declared
    #[error("field '{field}' is not declared in schema '{schema}'")]
    UndeclaredField { schema: String, field: String },

    /// The value handed to a field does not match the field's kind
    #[error("field '{field}' expects a {expected} value, got {found}")]
    TypeMismatch {
        field: String,
        expected: FieldKind,
        found: String,
    },

    #[error("field '{field}' is declared more than once in schema '{schema}'")]
    DuplicateField { schema: String, field: String },

    /// `Combine` only has a meaning for sequences and integers
    #[error("reducer {reducer} is not supported for {kind} field '{field}'")]
    UnsupportedReducer {
        field: String,
        kind: FieldKind,
        reducer: Reducer,
    },

    #[error("default value for field '{field}' is not a valid {kind}")]
    InvalidDefault { field: String, kind: FieldKind },

    /// A sub-graph field mapping names a field the inner schema lacks
    #[error("sub-graph '{graph}' has no field '{field}' to map")]
    UnknownMappedField { graph: String, field: String },
}
