// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for merge steps.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Several writers hit the same `Overwrite` field and the merge is running
/// in last-writer-wins mode. The surviving value depends on application order.
///
/// # Log Level
/// `warn!` - Potential non-determinism
///
/// # Example
/// ```
/// use the_stategraph::observability::messages::merge::OverwriteHazard;
///
/// let writers = vec!["a".to_string(), "b".to_string()];
/// let msg = OverwriteHazard {
///     field: "report",
///     writers: &writers,
///     winner: "b",
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Field 'report' written by [a, b] in one step; keeping value from 'b'"
/// );
/// ```
pub struct OverwriteHazard<'a> {
    pub field: &'a str,
    pub writers: &'a [String],
    pub winner: &'a str,
}

impl Display for OverwriteHazard<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Field '{}' written by [{}] in one step; keeping value from '{}'",
            self.field,
            self.writers.join(", "),
            self.winner
        )
    }
}

impl StructuredLog for OverwriteHazard<'_> {
    fn log(&self) {
        tracing::warn!(
            field = self.field,
            writer_count = self.writers.len(),
            winner = self.winner,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "overwrite_hazard",
            span_name = name,
            field = self.field,
            winner = self.winner,
        )
    }
}

/// All updates of one step were merged.
///
/// # Log Level
/// `trace!` - Per-step detail
pub struct StepMerged {
    pub update_count: usize,
    pub field_count: usize,
}

impl Display for StepMerged {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Merged {} updates touching {} fields",
            self.update_count, self.field_count
        )
    }
}

impl StructuredLog for StepMerged {
    fn log(&self) {
        tracing::trace!(
            update_count = self.update_count,
            field_count = self.field_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "step_merged",
            span_name = name,
            update_count = self.update_count,
        )
    }
}
