// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::graph::{END, START};
use crate::state::FieldKind;

/// A single structural problem found while compiling a graph.
///
/// Compilation collects every issue it can find before failing, so a caller
/// fixing a broken graph sees the whole list at once.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationIssue {
    #[error("duplicate node name '{node}'")]
    DuplicateNode { node: String },

    /// `__start__` and `__end__` belong to the graph markers
    #[error("node name '{node}' is reserved")]
    ReservedNodeName { node: String },

    #[error("edge '{from}' -> '{to}' references unknown node '{missing}'")]
    UnknownEdgeEndpoint {
        from: String,
        to: String,
        missing: String,
    },

    #[error("edge '{from}' -> '{}' points back into the start marker", START)]
    EdgeIntoStart { from: String },

    #[error("edge '{}' -> '{to}' leaves the end marker", END)]
    EdgeFromEnd { to: String },

    #[error("duplicate edge '{from}' -> '{to}'")]
    DuplicateEdge { from: String, to: String },

    #[error("no edge leaves the start marker")]
    MissingEntry,

    #[error("node '{node}' is not reachable from start")]
    Unreachable { node: String },

    #[error("node '{node}' has no path to end")]
    NoPathToEnd { node: String },

    #[error("cycle detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("node '{node}' writes field '{field}' which the schema does not declare")]
    UndeclaredWrite { node: String, field: String },

    #[error("node '{node}' reads field '{field}' which the schema does not declare")]
    UndeclaredRead { node: String, field: String },

    /// A sub-graph mapping joins fields whose kinds cannot hold each other's values
    #[error(
        "sub-graph node '{node}' maps {outer_kind} field '{outer}' to {inner_kind} field '{inner}'"
    )]
    MappedKindMismatch {
        node: String,
        outer: String,
        inner: String,
        outer_kind: FieldKind,
        inner_kind: FieldKind,
    },
}

/// Compilation failure; no partial graph is ever produced alongside it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("graph '{graph}' failed validation: {}", join_issues(.issues))]
pub struct GraphValidationError {
    pub graph: String,
    pub issues: Vec<ValidationIssue>,
}

impl GraphValidationError {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// True when any issue satisfies `predicate`
    pub fn any(&self, predicate: impl Fn(&ValidationIssue) -> bool) -> bool {
        self.issues.iter().any(predicate)
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_every_issue() {
        let error = GraphValidationError {
            graph: "entry".to_string(),
            issues: vec![
                ValidationIssue::Unreachable {
                    node: "orphan".to_string(),
                },
                ValidationIssue::Cycle {
                    path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
                },
            ],
        };

        let rendered = error.to_string();
        assert!(rendered.contains("graph 'entry'"));
        assert!(rendered.contains("node 'orphan' is not reachable from start"));
        assert!(rendered.contains("cycle detected: a -> b -> a"));
    }

    #[test]
    fn test_any_matches_issue_kind() {
        let error = GraphValidationError {
            graph: "g".to_string(),
            issues: vec![ValidationIssue::MissingEntry],
        };

        assert!(error.any(|issue| matches!(issue, ValidationIssue::MissingEntry)));
        assert!(!error.any(|issue| matches!(issue, ValidationIssue::Cycle { .. })));
    }
}
