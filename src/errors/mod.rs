// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod schema;
mod validation;

pub use config::ConfigError;
pub use execution::{ExecutionError, MergeConflictError, NodeError};
pub use schema::SchemaError;
pub use validation::{GraphValidationError, ValidationIssue};
