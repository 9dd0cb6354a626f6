// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Compiled graphs nested as nodes of a larger graph.
//!
//! A [`SubgraphAdapter`] owns a compiled inner graph and a declared field
//! mapping table. On dispatch it:
//!
//! 1. builds the inner initial state: every inner field at its declared
//!    default, overlaid with the mapped outer fields that are present;
//! 2. runs the inner graph to completion, the outer node awaiting it;
//! 3. projects the mapped inner output fields back out under their outer
//!    names as the node's partial update.
//!
//! Inner fields named by the mapping are checked when the adapter is built;
//! outer fields are checked when the outer graph compiles, through the
//! adapter's declared reads and writes. Compilation also rejects mapping rows
//! whose outer and inner kinds differ.
//!
//! ```
//! use the_stategraph::graph::{FnNode, NodeFunction, StateGraph, SubgraphAdapter, END, START};
//! use the_stategraph::state::{FieldKind, Reducer, StateSchema, StateUpdate};
//!
//! let inner_schema = StateSchema::new("inner")
//!     .declare("text", FieldKind::Text, Reducer::Overwrite)
//!     .unwrap()
//!     .declare("shout", FieldKind::Text, Reducer::Overwrite)
//!     .unwrap();
//! let mut inner = StateGraph::new("inner", inner_schema);
//! inner
//!     .add_node(
//!         "upper",
//!         FnNode::new(|s| Ok(StateUpdate::new().set("shout", s.get_str("text").unwrap_or("").to_uppercase()))),
//!     )
//!     .add_edge(START, "upper")
//!     .add_edge("upper", END);
//!
//! let adapter = SubgraphAdapter::builder(inner.compile().unwrap())
//!     .input("message", "text")
//!     .output("shout", "loud_message")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(adapter.declared_writes(), vec!["loud_message".to_string()]);
//! ```

use async_trait::async_trait;

use crate::engine::ExecutionEngine;
use crate::errors::{NodeError, SchemaError};
use crate::graph::{CompiledGraph, NodeFunction};
use crate::observability::messages::graph::SubgraphEntered;
use crate::observability::messages::StructuredLog;
use crate::state::{FieldKind, State, StateSnapshot, StateUpdate};

/// One row of a sub-graph's field mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub outer: String,
    pub inner: String,
}

pub struct SubgraphAdapterBuilder {
    graph: CompiledGraph,
    inputs: Vec<FieldMapping>,
    outputs: Vec<FieldMapping>,
    engine: ExecutionEngine,
}

impl SubgraphAdapterBuilder {
    /// Copy outer field `outer` into inner field `inner` on entry
    pub fn input(mut self, outer: impl Into<String>, inner: impl Into<String>) -> Self {
        self.inputs.push(FieldMapping {
            outer: outer.into(),
            inner: inner.into(),
        });
        self
    }

    /// Copy inner field `inner` into outer field `outer` on exit
    pub fn output(mut self, inner: impl Into<String>, outer: impl Into<String>) -> Self {
        self.outputs.push(FieldMapping {
            outer: outer.into(),
            inner: inner.into(),
        });
        self
    }

    /// Map a field that has the same name on both sides
    pub fn input_field(self, field: &str) -> Self {
        self.input(field, field)
    }

    pub fn output_field(self, field: &str) -> Self {
        self.output(field, field)
    }

    /// Engine used to run the inner graph; defaults to `ExecutionEngine::default()`
    pub fn engine(mut self, engine: ExecutionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn build(self) -> Result<SubgraphAdapter, SchemaError> {
        let schema = self.graph.schema();
        for mapping in self.inputs.iter().chain(self.outputs.iter()) {
            if !schema.contains(&mapping.inner) {
                return Err(SchemaError::UnknownMappedField {
                    graph: self.graph.name().to_string(),
                    field: mapping.inner.clone(),
                });
            }
        }

        Ok(SubgraphAdapter {
            graph: self.graph,
            inputs: self.inputs,
            outputs: self.outputs,
            engine: self.engine,
        })
    }
}

/// A compiled graph wrapped to run as one node.
pub struct SubgraphAdapter {
    graph: CompiledGraph,
    inputs: Vec<FieldMapping>,
    outputs: Vec<FieldMapping>,
    engine: ExecutionEngine,
}

impl SubgraphAdapter {
    pub fn builder(graph: CompiledGraph) -> SubgraphAdapterBuilder {
        SubgraphAdapterBuilder {
            graph,
            inputs: Vec::new(),
            outputs: Vec::new(),
            engine: ExecutionEngine::default(),
        }
    }

    pub fn graph(&self) -> &CompiledGraph {
        &self.graph
    }

    pub fn inputs(&self) -> &[FieldMapping] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[FieldMapping] {
        &self.outputs
    }

    /// Kind of the inner field a mapping row names
    pub fn inner_kind(&self, mapping: &FieldMapping) -> Option<FieldKind> {
        self.graph.schema().field(&mapping.inner).map(|spec| spec.kind)
    }

    /// Inner initial state for one dispatch
    pub fn inner_input(&self, outer: &StateSnapshot) -> StateUpdate {
        let schema = self.graph.schema();
        let mut initial: StateUpdate = schema
            .field_names()
            .filter_map(|field| schema.default_for(field).map(|value| (field, value)))
            .collect();

        for mapping in &self.inputs {
            if let Some(value) = outer.get(&mapping.outer) {
                initial.insert(mapping.inner.clone(), value.clone());
            }
        }

        initial
    }

    /// The node's partial update, taken from the inner final state
    pub fn project_output(&self, inner_final: &State) -> StateUpdate {
        let mut update = StateUpdate::new();
        for mapping in &self.outputs {
            if let Some(value) = inner_final.get(&mapping.inner) {
                update.insert(mapping.outer.clone(), value.clone());
            }
        }
        update
    }
}

#[async_trait]
impl NodeFunction for SubgraphAdapter {
    async fn run(&self, snapshot: StateSnapshot) -> Result<StateUpdate, NodeError> {
        let initial = self.inner_input(&snapshot);

        SubgraphEntered {
            graph: self.graph.name(),
            input_fields: self.inputs.len(),
            output_fields: self.outputs.len(),
        }
        .log();

        let inner_final = self
            .engine
            .invoke(&self.graph, initial)
            .await
            .map_err(|source| NodeError::Subgraph {
                graph: self.graph.name().to_string(),
                source: Box::new(source),
            })?;

        Ok(self.project_output(&inner_final))
    }

    fn declared_reads(&self) -> Vec<String> {
        self.inputs.iter().map(|m| m.outer.clone()).collect()
    }

    fn declared_writes(&self) -> Vec<String> {
        self.outputs.iter().map(|m| m.outer.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExecutionError;
    use crate::graph::{FnNode, StateGraph, END, START};
    use crate::state::{Reducer, StateSchema};
    use serde_json::json;

    fn inner_graph() -> CompiledGraph {
        let schema = StateSchema::new("inner")
            .declare("items", FieldKind::Sequence, Reducer::Overwrite)
            .unwrap()
            .declare("count", FieldKind::Integer, Reducer::Overwrite)
            .unwrap()
            .declare_with_default("label", FieldKind::Text, Reducer::Overwrite, json!("unset"))
            .unwrap();

        let mut graph = StateGraph::new("inner", schema);
        graph
            .add_node(
                "count_items",
                FnNode::new(|s| {
                    let count = s.get_sequence("items").map_or(0, <[_]>::len);
                    Ok(StateUpdate::new().set("count", count as i64))
                }),
            )
            .add_edge(START, "count_items")
            .add_edge("count_items", END);
        graph.compile().unwrap()
    }

    fn outer_snapshot(pairs: &[(&str, serde_json::Value)]) -> StateSnapshot {
        let mut schema = StateSchema::new("outer");
        for (field, _) in pairs {
            schema = schema.declare(*field, FieldKind::Any, Reducer::Overwrite).unwrap();
        }
        let initial: StateUpdate = pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        State::from_initial(&schema, initial).unwrap().snapshot()
    }

    #[test]
    fn test_build_rejects_unknown_inner_field() {
        let result = SubgraphAdapter::builder(inner_graph())
            .input("logs", "no_such_field")
            .build();

        assert!(matches!(
            result,
            Err(SchemaError::UnknownMappedField { ref field, .. }) if field == "no_such_field"
        ));
    }

    #[test]
    fn test_inner_input_uses_defaults_for_absent_fields() {
        let adapter = SubgraphAdapter::builder(inner_graph())
            .input("logs", "items")
            .input("title", "label")
            .build()
            .unwrap();

        let initial = adapter.inner_input(&outer_snapshot(&[("logs", json!([1, 2, 3]))]));

        assert_eq!(initial.get("items"), Some(&json!([1, 2, 3])));
        assert_eq!(initial.get("count"), Some(&json!(0)));
        assert_eq!(initial.get("label"), Some(&json!("unset")));
    }

    #[tokio::test]
    async fn test_run_projects_only_mapped_outputs() {
        let adapter = SubgraphAdapter::builder(inner_graph())
            .input("logs", "items")
            .output("count", "log_count")
            .build()
            .unwrap();

        let update = adapter
            .run(outer_snapshot(&[("logs", json!(["a", "b"]))]))
            .await
            .unwrap();

        assert_eq!(update.len(), 1);
        assert_eq!(update.get("log_count"), Some(&json!(2)));
        assert_eq!(adapter.declared_reads(), vec!["logs".to_string()]);
    }

    #[tokio::test]
    async fn test_inner_failure_is_wrapped() {
        let schema = StateSchema::new("failing")
            .declare("x", FieldKind::Integer, Reducer::Overwrite)
            .unwrap();
        let mut graph = StateGraph::new("failing", schema);
        graph
            .add_node("explode", FnNode::new(|_| Err(NodeError::failed("inner boom"))))
            .add_edge(START, "explode")
            .add_edge("explode", END);

        let adapter = SubgraphAdapter::builder(graph.compile().unwrap())
            .build()
            .unwrap();

        let err = adapter.run(State::empty().snapshot()).await.unwrap_err();
        match err {
            NodeError::Subgraph { graph, source } => {
                assert_eq!(graph, "failing");
                assert!(matches!(
                    *source,
                    ExecutionError::NodeExecution { ref node, .. } if node == "explode"
                ));
            }
            other => panic!("expected sub-graph error, got {other:?}"),
        }
    }
}
