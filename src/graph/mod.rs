// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod compiled;
mod node;
mod state_graph;
mod subgraph;
mod validation;

pub use compiled::CompiledGraph;
pub use node::{FnNode, Node, NodeAction, NodeFunction};
pub use state_graph::StateGraph;
pub use subgraph::{FieldMapping, SubgraphAdapter, SubgraphAdapterBuilder};

/// Virtual entry marker. Edges from it name a graph's entry nodes.
pub const START: &str = "__start__";

/// Virtual exit marker. Reaching it ends an invocation.
pub const END: &str = "__end__";
