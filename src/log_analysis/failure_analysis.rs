// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Failure-analysis sub-graph: `START -> get_failures -> generate_summary -> END`.

use crate::errors::NodeError;
use crate::graph::{CompiledGraph, FnNode, StateGraph, END, START};
use crate::log_analysis::{BuildError, LogRecord};
use crate::state::{FieldKind, Reducer, StateSchema, StateSnapshot, StateUpdate};

pub const GRAPH_NAME: &str = "failure_analysis";

pub const FA_SUMMARY: &str = "Poor quality retrieval of Chroma documentation.";

pub fn schema() -> Result<StateSchema, BuildError> {
    Ok(StateSchema::new(GRAPH_NAME)
        .declare("cleaned_logs", FieldKind::Sequence, Reducer::Overwrite)?
        .declare("failures", FieldKind::Sequence, Reducer::Overwrite)?
        .declare("fa_summary", FieldKind::Text, Reducer::Overwrite)?
        .declare("processed_logs", FieldKind::Sequence, Reducer::Overwrite)?)
}

fn get_failures(snapshot: &StateSnapshot) -> Result<StateUpdate, NodeError> {
    let logs: Vec<LogRecord> = snapshot.get_as("cleaned_logs")?;
    let failures: Vec<LogRecord> = logs.into_iter().filter(LogRecord::contains_failure).collect();
    StateUpdate::new().set_serialized("failures", &failures)
}

fn generate_summary(snapshot: &StateSnapshot) -> Result<StateUpdate, NodeError> {
    let failures: Vec<LogRecord> = snapshot.get_as("failures")?;
    let processed: Vec<String> = failures
        .iter()
        .map(|failure| format!("failure-analysis-on-log-{}", failure.id))
        .collect();

    StateUpdate::new()
        .set("fa_summary", FA_SUMMARY)
        .set_serialized("processed_logs", &processed)
}

pub fn build() -> Result<CompiledGraph, BuildError> {
    let mut graph = StateGraph::new(GRAPH_NAME, schema()?);
    graph
        .add_node(
            "get_failures",
            FnNode::new(get_failures).reads(["cleaned_logs"]).writes(["failures"]),
        )
        .add_node(
            "generate_summary",
            FnNode::new(generate_summary)
                .reads(["failures"])
                .writes(["fa_summary", "processed_logs"]),
        )
        .add_edge(START, "get_failures")
        .add_edge("get_failures", "generate_summary")
        .add_edge("generate_summary", END);

    Ok(graph.compile()?)
}
