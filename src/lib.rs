// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;        // engine configuration
pub mod engine;        // step scheduler
pub mod errors;        // error handling
pub mod graph;         // graph builder, compiler, sub-graphs
pub mod log_analysis;  // log-analysis graphs
pub mod observability;
pub mod state;         // schema, state container, merger
