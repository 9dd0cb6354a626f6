// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::errors::NodeError;
use crate::graph::SubgraphAdapter;
use crate::state::{StateSnapshot, StateUpdate};

/// A unit of work in a graph.
///
/// A node receives an immutable snapshot of the state as it stood at the
/// start of its step and returns a partial update. The field sets returned by
/// `declared_reads` and `declared_writes` are checked against the owning
/// schema when the graph compiles; the merge step re-checks every returned
/// field at run time regardless.
#[async_trait]
pub trait NodeFunction: Send + Sync {
    async fn run(&self, snapshot: StateSnapshot) -> Result<StateUpdate, NodeError>;

    fn declared_reads(&self) -> Vec<String> {
        Vec::new()
    }

    fn declared_writes(&self) -> Vec<String> {
        Vec::new()
    }
}

type TransitionFn = dyn Fn(&StateSnapshot) -> Result<StateUpdate, NodeError> + Send + Sync;

/// A plain synchronous state-transition function wrapped as a node.
///
/// ```
/// use the_stategraph::graph::FnNode;
/// use the_stategraph::state::StateUpdate;
///
/// let node = FnNode::new(|snapshot| {
///     let raw = snapshot.require("raw_logs")?.clone();
///     Ok(StateUpdate::new().set("cleaned_logs", raw))
/// })
/// .reads(["raw_logs"])
/// .writes(["cleaned_logs"]);
/// ```
#[derive(Clone)]
pub struct FnNode {
    func: Arc<TransitionFn>,
    reads: Vec<String>,
    writes: Vec<String>,
}

impl FnNode {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&StateSnapshot) -> Result<StateUpdate, NodeError> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    pub fn reads<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reads.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn writes<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.writes.extend(fields.into_iter().map(Into::into));
        self
    }
}

#[async_trait]
impl NodeFunction for FnNode {
    async fn run(&self, snapshot: StateSnapshot) -> Result<StateUpdate, NodeError> {
        (self.func)(&snapshot)
    }

    fn declared_reads(&self) -> Vec<String> {
        self.reads.clone()
    }

    fn declared_writes(&self) -> Vec<String> {
        self.writes.clone()
    }
}

impl fmt::Debug for FnNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnNode")
            .field("reads", &self.reads)
            .field("writes", &self.writes)
            .finish()
    }
}

/// What a node runs: a function, or a whole compiled graph.
#[derive(Clone)]
pub enum NodeAction {
    Function(Arc<dyn NodeFunction>),
    Subgraph(Arc<SubgraphAdapter>),
}

impl NodeAction {
    /// The callable the engine dispatches. Both variants look the same from here.
    pub(crate) fn runner(&self) -> Arc<dyn NodeFunction> {
        match self {
            NodeAction::Function(func) => func.clone(),
            NodeAction::Subgraph(adapter) => adapter.clone() as Arc<dyn NodeFunction>,
        }
    }

    pub fn is_subgraph(&self) -> bool {
        matches!(self, NodeAction::Subgraph(_))
    }

    pub fn declared_reads(&self) -> Vec<String> {
        match self {
            NodeAction::Function(func) => func.declared_reads(),
            NodeAction::Subgraph(adapter) => adapter.declared_reads(),
        }
    }

    pub fn declared_writes(&self) -> Vec<String> {
        match self {
            NodeAction::Function(func) => func.declared_writes(),
            NodeAction::Subgraph(adapter) => adapter.declared_writes(),
        }
    }
}

impl fmt::Debug for NodeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeAction::Function(_) => f.write_str("Function"),
            NodeAction::Subgraph(adapter) => write!(f, "Subgraph({})", adapter.graph().name()),
        }
    }
}

/// A named node as registered on a graph builder.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub action: NodeAction,
}
