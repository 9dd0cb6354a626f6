// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Question-summarization sub-graph: `START -> generate_summary -> send_to_slack -> END`.

use crate::errors::NodeError;
use crate::graph::{CompiledGraph, FnNode, StateGraph, END, START};
use crate::log_analysis::{BuildError, LogRecord};
use crate::state::{FieldKind, Reducer, StateSchema, StateSnapshot, StateUpdate};

pub const GRAPH_NAME: &str = "question_summarization";

pub const QS_SUMMARY: &str = "Questions focused on usage of ChatOllama and Chroma vector store.";

pub fn schema() -> Result<StateSchema, BuildError> {
    Ok(StateSchema::new(GRAPH_NAME)
        .declare("cleaned_logs", FieldKind::Sequence, Reducer::Overwrite)?
        .declare("qs_summary", FieldKind::Text, Reducer::Overwrite)?
        .declare("report", FieldKind::Text, Reducer::Overwrite)?
        .declare("processed_logs", FieldKind::Sequence, Reducer::Overwrite)?)
}

fn generate_summary(snapshot: &StateSnapshot) -> Result<StateUpdate, NodeError> {
    let logs: Vec<LogRecord> = snapshot.get_as("cleaned_logs")?;
    let processed: Vec<String> = logs
        .iter()
        .map(|log| format!("summary-on-log-{}", log.id))
        .collect();

    StateUpdate::new()
        .set("qs_summary", QS_SUMMARY)
        .set_serialized("processed_logs", &processed)
}

fn send_to_slack(snapshot: &StateSnapshot) -> Result<StateUpdate, NodeError> {
    let summary = snapshot.get_str("qs_summary").unwrap_or_default();
    if summary.is_empty() {
        return Err(NodeError::failed("no question summary to report"));
    }
    Ok(StateUpdate::new().set("report", format!("Weekly question report: {}", summary)))
}

pub fn build() -> Result<CompiledGraph, BuildError> {
    let mut graph = StateGraph::new(GRAPH_NAME, schema()?);
    graph
        .add_node(
            "generate_summary",
            FnNode::new(generate_summary)
                .reads(["cleaned_logs"])
                .writes(["qs_summary", "processed_logs"]),
        )
        .add_node(
            "send_to_slack",
            FnNode::new(send_to_slack).reads(["qs_summary"]).writes(["report"]),
        )
        .add_edge(START, "generate_summary")
        .add_edge("generate_summary", "send_to_slack")
        .add_edge("send_to_slack", END);

    Ok(graph.compile()?)
}
