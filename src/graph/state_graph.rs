// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Graph builder: register nodes and edges, then compile.
//!
//! ```
//! use the_stategraph::graph::{FnNode, StateGraph, END, START};
//! use the_stategraph::state::{FieldKind, Reducer, StateSchema, StateUpdate};
//!
//! let schema = StateSchema::new("greeting")
//!     .declare("name", FieldKind::Text, Reducer::Overwrite)
//!     .unwrap()
//!     .declare("greeting", FieldKind::Text, Reducer::Overwrite)
//!     .unwrap();
//!
//! let mut graph = StateGraph::new("greeting", schema);
//! graph
//!     .add_node(
//!         "greet",
//!         FnNode::new(|snapshot| {
//!             let name = snapshot.get_str("name").unwrap_or("world");
//!             Ok(StateUpdate::new().set("greeting", format!("hello {name}")))
//!         })
//!         .writes(["greeting"]),
//!     )
//!     .add_edge(START, "greet")
//!     .add_edge("greet", END);
//!
//! let compiled = graph.compile().unwrap();
//! assert_eq!(compiled.entry_nodes().collect::<Vec<_>>(), vec!["greet"]);
//! ```

use std::sync::Arc;

use crate::errors::GraphValidationError;
use crate::graph::compiled::CompiledGraph;
use crate::graph::node::{Node, NodeAction, NodeFunction};
use crate::graph::validation::validate_graph;
use crate::graph::SubgraphAdapter;
use crate::observability::messages::graph::{GraphCompiled, GraphValidationFailed};
use crate::observability::messages::StructuredLog;
use crate::state::StateSchema;

/// Mutable graph definition. Nothing is checked until [`StateGraph::compile`].
pub struct StateGraph {
    pub(crate) name: String,
    pub(crate) schema: StateSchema,
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<(String, String)>,
}

impl StateGraph {
    pub fn new(name: impl Into<String>, schema: StateSchema) -> Self {
        Self {
            name: name.into(),
            schema,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn add_node(&mut self, name: impl Into<String>, node: impl NodeFunction + 'static) -> &mut Self {
        self.add_shared_node(name, Arc::new(node))
    }

    /// Register a node whose implementation is shared with other graphs
    pub fn add_shared_node(&mut self, name: impl Into<String>, node: Arc<dyn NodeFunction>) -> &mut Self {
        self.nodes.push(Node {
            name: name.into(),
            action: NodeAction::Function(node),
        });
        self
    }

    /// Register a compiled graph as a single node
    pub fn add_subgraph(&mut self, name: impl Into<String>, adapter: SubgraphAdapter) -> &mut Self {
        self.nodes.push(Node {
            name: name.into(),
            action: NodeAction::Subgraph(Arc::new(adapter)),
        });
        self
    }

    /// Add an unconditional edge. `from` may be [`START`](crate::graph::START),
    /// `to` may be [`END`](crate::graph::END).
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    /// Validate the topology and freeze it into an executable graph.
    ///
    /// Every issue found is reported together; on failure no graph is produced.
    pub fn compile(self) -> Result<CompiledGraph, GraphValidationError> {
        let topology = match validate_graph(&self) {
            Ok(topology) => topology,
            Err(error) => {
                GraphValidationFailed {
                    graph: &self.name,
                    issue_count: error.issues.len(),
                }
                .log();
                return Err(error);
            }
        };

        let edge_count = self.edges.len();
        let compiled = CompiledGraph::new(self.name, self.schema, self.nodes, topology, edge_count);

        GraphCompiled {
            graph: compiled.name(),
            node_count: compiled.node_count(),
            edge_count,
            level_count: compiled.topological_levels().len(),
        }
        .log();

        Ok(compiled)
    }
}
