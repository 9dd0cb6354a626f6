// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! * `engine` - invocation lifecycle, step dispatch and node outcomes
//! * `graph` - compilation results and sub-graph entry
//! * `merge` - merge steps and overwrite hazards

pub mod engine;
pub mod graph;
pub mod merge;

use tracing::Span;

/// A message that knows its own tracing level and fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event
    fn log(&self);

    /// Build a span carrying the message's fields
    fn span(&self, name: &str) -> Span;
}
