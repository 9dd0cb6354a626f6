// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::engine::ExecutionEngine;
use crate::errors::ExecutionError;
use crate::graph::node::{Node, NodeAction};
use crate::graph::validation::Topology;
use crate::graph::{END, START};
use crate::state::{State, StateSchema, StateUpdate};

/// A validated, immutable graph ready to be invoked.
///
/// Cloning is cheap; clones share the same frozen topology. Every invocation
/// builds its own state, so one `CompiledGraph` can serve any number of
/// concurrent invocations.
#[derive(Clone)]
pub struct CompiledGraph {
    inner: Arc<GraphInner>,
}

struct GraphInner {
    name: String,
    schema: StateSchema,
    nodes: BTreeMap<String, NodeAction>,
    predecessors: BTreeMap<String, BTreeSet<String>>,
    successors: BTreeMap<String, BTreeSet<String>>,
    edge_count: usize,
}

impl CompiledGraph {
    pub(crate) fn new(
        name: String,
        schema: StateSchema,
        nodes: Vec<Node>,
        topology: Topology,
        edge_count: usize,
    ) -> Self {
        let nodes = nodes
            .into_iter()
            .map(|node| (node.name, node.action))
            .collect();

        Self {
            inner: Arc::new(GraphInner {
                name,
                schema,
                nodes,
                predecessors: topology.predecessors,
                successors: topology.successors,
                edge_count,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn schema(&self) -> &StateSchema {
        &self.inner.schema
    }

    pub fn node_count(&self) -> usize {
        self.inner.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.inner.nodes.keys().map(String::as_str)
    }

    pub fn node(&self, name: &str) -> Option<&NodeAction> {
        self.inner.nodes.get(name)
    }

    /// Nodes with an edge into `name`; may include `START`
    pub fn predecessors(&self, name: &str) -> impl Iterator<Item = &str> {
        self.inner
            .predecessors
            .get(name)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Nodes `name` has an edge to; may include `END`
    pub fn successors(&self, name: &str) -> impl Iterator<Item = &str> {
        self.inner
            .successors
            .get(name)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Direct successors of `START`
    pub fn entry_nodes(&self) -> impl Iterator<Item = &str> {
        self.successors(START).filter(|name| *name != END)
    }

    /// Direct predecessors of `END`
    pub fn terminal_nodes(&self) -> impl Iterator<Item = &str> {
        self.predecessors(END).filter(|name| *name != START)
    }

    /// Group nodes into levels: every node's predecessors sit in earlier
    /// levels. This is the order the engine's steps follow.
    pub fn topological_levels(&self) -> Vec<Vec<String>> {
        let mut in_degree: HashMap<&str, usize> = self
            .node_names()
            .map(|name| {
                let count = self.predecessors(name).filter(|p| *p != START).count();
                (name, count)
            })
            .collect();

        let mut current: Vec<&str> = self
            .node_names()
            .filter(|name| in_degree.get(name) == Some(&0))
            .collect();
        let mut levels = Vec::new();

        while !current.is_empty() {
            let mut next = BTreeSet::new();
            for name in &current {
                for successor in self.successors(name) {
                    if let Some(count) = in_degree.get_mut(successor) {
                        *count -= 1;
                        if *count == 0 {
                            next.insert(successor);
                        }
                    }
                }
            }
            levels.push(current.iter().map(|n| n.to_string()).collect());
            current = next.into_iter().collect();
        }

        levels
    }

    /// Run the graph to completion with a default engine.
    pub async fn invoke(&self, initial: StateUpdate) -> Result<State, ExecutionError> {
        ExecutionEngine::default().invoke(self, initial).await
    }

    pub async fn invoke_with(
        &self,
        engine: &ExecutionEngine,
        initial: StateUpdate,
    ) -> Result<State, ExecutionError> {
        engine.invoke(self, initial).await
    }
}

impl fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("name", &self.inner.name)
            .field("nodes", &self.inner.nodes)
            .field("edge_count", &self.inner.edge_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{FnNode, StateGraph, END, START};
    use crate::state::{FieldKind, Reducer, StateSchema, StateUpdate};

    fn noop() -> FnNode {
        FnNode::new(|_| Ok(StateUpdate::new()))
    }

    fn diamond() -> StateGraph {
        let schema = StateSchema::new("diamond")
            .declare("value", FieldKind::Text, Reducer::Overwrite)
            .unwrap();
        let mut graph = StateGraph::new("diamond", schema);
        graph
            .add_node("a", noop())
            .add_node("b", noop())
            .add_node("c", noop())
            .add_node("d", noop())
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("a", "c")
            .add_edge("b", "d")
            .add_edge("c", "d")
            .add_edge("d", END);
        graph
    }

    #[test]
    fn test_compiled_topology() {
        let compiled = diamond().compile().unwrap();

        assert_eq!(compiled.name(), "diamond");
        assert_eq!(compiled.node_count(), 4);
        assert_eq!(compiled.edge_count(), 6);
        assert_eq!(compiled.entry_nodes().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(compiled.terminal_nodes().collect::<Vec<_>>(), vec!["d"]);
        assert_eq!(compiled.predecessors("d").collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(compiled.successors("a").collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn test_topological_levels() {
        let levels = diamond().compile().unwrap().topological_levels();

        assert_eq!(
            levels,
            vec![
                vec!["a".to_string()],
                vec!["b".to_string(), "c".to_string()],
                vec!["d".to_string()],
            ]
        );
    }

    #[test]
    fn test_compile_failure_produces_no_graph() {
        let mut graph = diamond();
        graph.add_node("island", noop());

        let err = graph.compile().unwrap_err();
        assert_eq!(err.graph, "diamond");
        assert!(!err.issues.is_empty());
    }
}
