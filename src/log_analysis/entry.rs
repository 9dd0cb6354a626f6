// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Entry graph: clean the raw logs, then fan out to both analysis sub-graphs.
//!
//! ```text
//!                      +-> failure_analysis -------+
//! START -> clean_logs -+                           +-> END
//!                      +-> question_summarization -+
//! ```
//!
//! Both sub-graphs append to `processed_logs`, which the entry schema
//! declares with a `Combine` reducer. Every other field has exactly one
//! writer.

use serde::Serialize;

use crate::engine::ExecutionEngine;
use crate::errors::NodeError;
use crate::graph::{CompiledGraph, FnNode, StateGraph, SubgraphAdapter, END, START};
use crate::log_analysis::{
    failure_analysis, question_summarization, AnalysisError, BuildError, LogRecord,
};
use crate::state::{FieldKind, Reducer, State, StateSchema, StateSnapshot, StateUpdate};

pub const GRAPH_NAME: &str = "entry";

pub fn schema() -> Result<StateSchema, BuildError> {
    Ok(StateSchema::new(GRAPH_NAME)
        .declare("raw_logs", FieldKind::Sequence, Reducer::Overwrite)?
        .declare("cleaned_logs", FieldKind::Sequence, Reducer::Overwrite)?
        .declare("fa_summary", FieldKind::Text, Reducer::Overwrite)?
        .declare("report", FieldKind::Text, Reducer::Overwrite)?
        .declare("processed_logs", FieldKind::Sequence, Reducer::Combine)?)
}

fn clean_logs(snapshot: &StateSnapshot) -> Result<StateUpdate, NodeError> {
    let raw: Vec<LogRecord> = snapshot.get_as("raw_logs")?;
    let cleaned: Vec<LogRecord> = raw.iter().map(LogRecord::cleaned).collect();
    StateUpdate::new().set_serialized("cleaned_logs", &cleaned)
}

/// Compile the entry graph with both sub-graphs nested in it.
///
/// Sub-graphs are compiled once here and shared by every invocation of
/// the returned graph. They run on `engine`.
pub fn build_entry_graph(engine: &ExecutionEngine) -> Result<CompiledGraph, BuildError> {
    let fa_adapter = SubgraphAdapter::builder(failure_analysis::build()?)
        .input_field("cleaned_logs")
        .output_field("fa_summary")
        .output_field("processed_logs")
        .engine(engine.clone())
        .build()?;

    let qs_adapter = SubgraphAdapter::builder(question_summarization::build()?)
        .input_field("cleaned_logs")
        .output_field("report")
        .output_field("processed_logs")
        .engine(engine.clone())
        .build()?;

    let mut graph = StateGraph::new(GRAPH_NAME, schema()?);
    graph
        .add_node(
            "clean_logs",
            FnNode::new(clean_logs).reads(["raw_logs"]).writes(["cleaned_logs"]),
        )
        .add_subgraph(failure_analysis::GRAPH_NAME, fa_adapter)
        .add_subgraph(question_summarization::GRAPH_NAME, qs_adapter)
        .add_edge(START, "clean_logs")
        .add_edge("clean_logs", failure_analysis::GRAPH_NAME)
        .add_edge("clean_logs", question_summarization::GRAPH_NAME)
        .add_edge(failure_analysis::GRAPH_NAME, END)
        .add_edge(question_summarization::GRAPH_NAME, END);

    Ok(graph.compile()?)
}

/// The fields a caller reads out of a finished analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub fa_summary: String,
    pub report: String,
    pub processed_logs: Vec<String>,
}

impl AnalysisReport {
    fn from_state(state: &State) -> Result<Self, AnalysisError> {
        let text = |field: &str| {
            state
                .get(field)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| AnalysisError::MissingOutput {
                    field: field.to_string(),
                })
        };

        Ok(Self {
            fa_summary: text("fa_summary")?,
            report: text("report")?,
            processed_logs: state.get_as("processed_logs").ok_or_else(|| {
                AnalysisError::MissingOutput {
                    field: "processed_logs".to_string(),
                }
            })?,
        })
    }
}

/// A compiled entry graph bound to the engine that runs it.
#[derive(Debug, Clone)]
pub struct LogAnalysis {
    graph: CompiledGraph,
    engine: ExecutionEngine,
}

impl LogAnalysis {
    pub fn build(engine: ExecutionEngine) -> Result<Self, BuildError> {
        let graph = build_entry_graph(&engine)?;
        Ok(Self { graph, engine })
    }

    pub fn graph(&self) -> &CompiledGraph {
        &self.graph
    }

    /// Run the entry graph on `logs` and return the whole final state
    pub async fn run(&self, logs: &[LogRecord]) -> Result<State, AnalysisError> {
        let initial = StateUpdate::new().set("raw_logs", serde_json::to_value(logs)?);
        Ok(self.engine.invoke(&self.graph, initial).await?)
    }

    pub async fn analyze(&self, logs: &[LogRecord]) -> Result<AnalysisReport, AnalysisError> {
        let state = self.run(logs).await?;
        AnalysisReport::from_state(&state)
    }
}
