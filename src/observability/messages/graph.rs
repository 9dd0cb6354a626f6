// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graph compilation and sub-graph entry.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Graph compiled successfully.
///
/// # Log Level
/// `debug!` - Build-time detail
///
/// # Example
/// ```
/// use the_stategraph::observability::messages::graph::GraphCompiled;
///
/// let msg = GraphCompiled {
///     graph: "failure_analysis",
///     node_count: 2,
///     edge_count: 3,
///     level_count: 2,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Compiled graph 'failure_analysis': 2 nodes, 3 edges, 2 levels"
/// );
/// ```
pub struct GraphCompiled<'a> {
    pub graph: &'a str,
    pub node_count: usize,
    pub edge_count: usize,
    pub level_count: usize,
}

impl Display for GraphCompiled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Compiled graph '{}': {} nodes, {} edges, {} levels",
            self.graph, self.node_count, self.edge_count, self.level_count
        )
    }
}

impl StructuredLog for GraphCompiled<'_> {
    fn log(&self) {
        tracing::debug!(
            graph = self.graph,
            node_count = self.node_count,
            edge_count = self.edge_count,
            level_count = self.level_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "graph_compiled",
            span_name = name,
            graph = self.graph,
            node_count = self.node_count,
        )
    }
}

/// Graph failed validation.
///
/// # Log Level
/// `warn!` - The caller gets the error, this records it
pub struct GraphValidationFailed<'a> {
    pub graph: &'a str,
    pub issue_count: usize,
}

impl Display for GraphValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph '{}' failed validation with {} issues",
            self.graph, self.issue_count
        )
    }
}

impl StructuredLog for GraphValidationFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            graph = self.graph,
            issue_count = self.issue_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "graph_validation_failed",
            span_name = name,
            graph = self.graph,
            issue_count = self.issue_count,
        )
    }
}

/// A sub-graph node handed its mapped inputs to the inner graph.
///
/// # Log Level
/// `debug!` - Scheduling detail
pub struct SubgraphEntered<'a> {
    pub graph: &'a str,
    pub input_fields: usize,
    pub output_fields: usize,
}

impl Display for SubgraphEntered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Entering sub-graph '{}': {} mapped inputs, {} mapped outputs",
            self.graph, self.input_fields, self.output_fields
        )
    }
}

impl StructuredLog for SubgraphEntered<'_> {
    fn log(&self) {
        tracing::debug!(
            graph = self.graph,
            input_fields = self.input_fields,
            output_fields = self.output_fields,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "subgraph",
            span_name = name,
            graph = self.graph,
        )
    }
}
