// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graph invocation lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Invocation start, completion and failure
//! * Step dispatch of ready nodes
//! * Individual node outcomes

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Invocation of a compiled graph started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_stategraph::observability::messages::engine::InvocationStarted;
///
/// let msg = InvocationStarted {
///     graph: "entry",
///     node_count: 3,
///     max_concurrency: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct InvocationStarted<'a> {
    pub graph: &'a str,
    pub node_count: usize,
    pub max_concurrency: usize,
}

impl Display for InvocationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Invoking graph '{}': {} nodes, max_concurrency={}",
            self.graph, self.node_count, self.max_concurrency
        )
    }
}

impl StructuredLog for InvocationStarted<'_> {
    fn log(&self) {
        tracing::info!(
            graph = self.graph,
            node_count = self.node_count,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "invocation",
            span_name = name,
            graph = self.graph,
            node_count = self.node_count,
            max_concurrency = self.max_concurrency,
        )
    }
}

/// Invocation reached the end marker.
///
/// # Log Level
/// `info!` - Important operational event
pub struct InvocationCompleted<'a> {
    pub graph: &'a str,
    pub steps: usize,
    pub field_count: usize,
    pub duration: std::time::Duration,
}

impl Display for InvocationCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph '{}' completed in {} steps with {} fields in {:?}",
            self.graph, self.steps, self.field_count, self.duration
        )
    }
}

impl StructuredLog for InvocationCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            graph = self.graph,
            steps = self.steps,
            field_count = self.field_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "invocation_completed",
            span_name = name,
            graph = self.graph,
            steps = self.steps,
            duration = ?self.duration,
        )
    }
}

/// Invocation failed with error.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_stategraph::observability::messages::engine::InvocationFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "test error");
/// let msg = InvocationFailed {
///     graph: "entry",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct InvocationFailed<'a> {
    pub graph: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for InvocationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Graph '{}' failed: {}", self.graph, self.error)
    }
}

impl StructuredLog for InvocationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            graph = self.graph,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "invocation_failed",
            span_name = name,
            graph = self.graph,
            error = %self.error,
        )
    }
}

/// A step dispatched its ready frontier.
///
/// # Log Level
/// `debug!` - Scheduling detail
pub struct StepDispatched<'a> {
    pub graph: &'a str,
    pub step: usize,
    pub nodes: &'a [String],
}

impl Display for StepDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph '{}' step {}: dispatching [{}]",
            self.graph,
            self.step,
            self.nodes.join(", ")
        )
    }
}

impl StructuredLog for StepDispatched<'_> {
    fn log(&self) {
        tracing::debug!(
            graph = self.graph,
            step = self.step,
            node_count = self.nodes.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "step",
            span_name = name,
            graph = self.graph,
            step = self.step,
            nodes = %self.nodes.join(","),
        )
    }
}

/// A node returned its partial update.
///
/// # Log Level
/// `debug!` - Scheduling detail
pub struct NodeCompleted<'a> {
    pub node: &'a str,
    pub fields_written: usize,
    pub duration: std::time::Duration,
}

impl Display for NodeCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' completed: {} fields written in {:?}",
            self.node, self.fields_written, self.duration
        )
    }
}

impl StructuredLog for NodeCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            node = self.node,
            fields_written = self.fields_written,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node_completed",
            span_name = name,
            node = self.node,
            fields_written = self.fields_written,
        )
    }
}

/// A node failed; the invocation is about to abort.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct NodeFailed<'a> {
    pub node: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for NodeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' failed: {}", self.node, self.error)
    }
}

impl StructuredLog for NodeFailed<'_> {
    fn log(&self) {
        tracing::error!(
            node = self.node,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "node_failed",
            span_name = name,
            node = self.node,
            error = %self.error,
        )
    }
}
