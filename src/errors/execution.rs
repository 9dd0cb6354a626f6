// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while a compiled graph is being invoked.

use thiserror::Error;

use crate::errors::SchemaError;

/// Failure reported by a single node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("{message}")]
    Failed { message: String },

    #[error("required field '{field}' is absent from the snapshot")]
    MissingField { field: String },

    #[error("field '{field}' could not be converted: {source}")]
    Serialization {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    /// The inner graph of a sub-graph node failed; the inner error is kept whole
    #[error("sub-graph '{graph}' failed: {source}")]
    Subgraph {
        graph: String,
        #[source]
        source: Box<ExecutionError>,
    },

    #[error("node panicked: {message}")]
    Panicked { message: String },
}

impl NodeError {
    pub fn failed(message: impl Into<String>) -> Self {
        NodeError::Failed {
            message: message.into(),
        }
    }
}

/// Several nodes wrote the same `Overwrite` field in one merge step.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "field '{field}' was written by {} nodes in the same step ({})",
    .writers.len(),
    .writers.join(", ")
)]
pub struct MergeConflictError {
    pub field: String,
    pub writers: Vec<String>,
}

/// The single typed error an invocation fails with.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("node '{node}' failed: {source}")]
    NodeExecution {
        node: String,
        #[source]
        source: NodeError,
    },

    #[error(transparent)]
    MergeConflict(#[from] MergeConflictError),

    #[error("internal engine error: {message}")]
    Internal { message: String },
}

impl ExecutionError {
    /// Name of the outer node that failed, if the failure came from a node
    pub fn failed_node(&self) -> Option<&str> {
        match self {
            ExecutionError::NodeExecution { node, .. } => Some(node),
            _ => None,
        }
    }
}
