// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic the crate emits goes through a message type in
//! [`messages`]. Each message implements `Display` for the human-readable
//! line and [`messages::StructuredLog`] to emit it as a `tracing` event with
//! typed fields, or to open a span carrying the same fields.
//!
//! # Usage
//!
//! ```rust
//! use the_stategraph::observability::messages::StructuredLog;
//! use the_stategraph::observability::messages::engine::InvocationStarted;
//!
//! let msg = InvocationStarted {
//!     graph: "entry",
//!     node_count: 3,
//!     max_concurrency: 4,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
