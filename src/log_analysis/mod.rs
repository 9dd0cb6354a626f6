// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Log analysis over question/answer logs, built from two sub-graphs.
//!
//! The nodes here are placeholders for real summarization work; what they
//! exercise is the engine: fan-out from one node, two nested graphs running
//! in the same step, and a `Combine` field both of them append to.
//!
//! ```no_run
//! use the_stategraph::engine::ExecutionEngine;
//! use the_stategraph::log_analysis::{load_logs, LogAnalysis};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let logs = load_logs("configs/sample-logs.yaml")?;
//! let analysis = LogAnalysis::build(ExecutionEngine::default())?;
//! let report = analysis.analyze(&logs).await?;
//! println!("{}", report.fa_summary);
//! # Ok(())
//! # }
//! ```

pub mod entry;
pub mod failure_analysis;
pub mod question_summarization;
mod record;

use thiserror::Error;

use crate::errors::{ExecutionError, GraphValidationError, SchemaError};

pub use entry::{build_entry_graph, AnalysisReport, LogAnalysis};
pub use record::{load_logs, LogRecord};

/// A log-analysis graph could not be assembled.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validation(#[from] GraphValidationError),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("log records could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("analysis finished without writing '{field}'")]
    MissingOutput { field: String },
}
