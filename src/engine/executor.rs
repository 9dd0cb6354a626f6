// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Step scheduler for compiled graphs.
//!
//! The engine tracks, for every node, how many of its predecessors are still
//! outstanding. Nodes whose count reaches zero form the frontier of the next
//! step. Each step runs in three phases:
//!
//! 1. **Snapshot**: the state is frozen once; every node dispatched in the
//!    step reads the same snapshot, so siblings never observe each other.
//! 2. **Dispatch**: every frontier node runs concurrently on a
//!    [`tokio::task::JoinSet`], bounded by a semaphore of `max_concurrency`
//!    permits. The step waits for all of them (fan-in barrier).
//! 3. **Merge**: the partial updates are folded into the state through the
//!    [`StateMerger`], in node-name order, then successor counters are
//!    decremented.
//!
//! The invocation ends when the frontier is empty, which for a validated
//! graph means every node ran and only `END` remains.
//!
//! ```text
//!   step 1        step 2                 step 3
//!   clean_logs -> failure_analysis    -> END
//!              \> question_summarization /
//! ```
//!
//! A node failure aborts the tasks still running in the step and fails the
//! whole invocation; no partial state is returned.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

use crate::errors::{ExecutionError, NodeError};
use crate::graph::{CompiledGraph, NodeAction, END, START};
use crate::observability::messages::engine::{
    InvocationCompleted, InvocationFailed, InvocationStarted, NodeCompleted, NodeFailed,
    StepDispatched,
};
use crate::observability::messages::StructuredLog;
use crate::state::{MergeMode, State, StateMerger, StateSnapshot, StateUpdate};

const FALLBACK_CONCURRENCY: usize = 4;

/// Tunables for one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Upper bound on nodes running at once within a step
    pub max_concurrency: usize,
    pub merge_mode: MergeMode,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_concurrency: default_concurrency(),
            merge_mode: MergeMode::default(),
        }
    }
}

/// Number of CPU cores, or a fixed fallback when it cannot be determined
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_CONCURRENCY)
}

/// Runs compiled graphs to completion.
///
/// The engine holds no per-invocation state; one engine can drive any number
/// of graphs and invocations at once.
#[derive(Debug, Clone, Default)]
pub struct ExecutionEngine {
    options: EngineOptions,
}

impl ExecutionEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options: EngineOptions {
                max_concurrency: options.max_concurrency.max(1),
                ..options
            },
        }
    }

    pub fn with_max_concurrency(max_concurrency: usize) -> Self {
        Self::new(EngineOptions {
            max_concurrency,
            ..EngineOptions::default()
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Seed a state from `initial` and run `graph` until `END`.
    ///
    /// Returns the final merged state, or the first error any step hit.
    pub async fn invoke(
        &self,
        graph: &CompiledGraph,
        initial: StateUpdate,
    ) -> Result<State, ExecutionError> {
        let started = InvocationStarted {
            graph: graph.name(),
            node_count: graph.node_count(),
            max_concurrency: self.options.max_concurrency,
        };
        started.log();
        let span = started.span("invoke");
        let clock = Instant::now();

        match self.run(graph, initial).instrument(span).await {
            Ok((state, steps)) => {
                InvocationCompleted {
                    graph: graph.name(),
                    steps,
                    field_count: state.len(),
                    duration: clock.elapsed(),
                }
                .log();
                Ok(state)
            }
            Err(error) => {
                InvocationFailed {
                    graph: graph.name(),
                    error: &error,
                }
                .log();
                Err(error)
            }
        }
    }

    async fn run(
        &self,
        graph: &CompiledGraph,
        initial: StateUpdate,
    ) -> Result<(State, usize), ExecutionError> {
        let mut state = State::from_initial(graph.schema(), initial)?;
        let merger = StateMerger::new(graph.schema(), self.options.merge_mode);
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency));

        // START is satisfied before the first step
        let mut remaining: HashMap<&str, usize> = graph
            .node_names()
            .map(|name| (name, graph.predecessors(name).filter(|p| *p != START).count()))
            .collect();

        let mut frontier: Vec<String> = graph
            .node_names()
            .filter(|name| remaining.get(name) == Some(&0))
            .map(str::to_string)
            .collect();

        let mut step = 0;
        let mut completed = 0;

        while !frontier.is_empty() {
            step += 1;
            let dispatched = StepDispatched {
                graph: graph.name(),
                step,
                nodes: &frontier,
            };
            dispatched.log();
            let span = dispatched.span("step");

            let updates = self
                .run_step(graph, state.snapshot(), &frontier, &semaphore)
                .instrument(span)
                .await?;
            merger.apply_step(&mut state, updates)?;
            completed += frontier.len();

            let mut next = BTreeSet::new();
            for name in &frontier {
                for successor in graph.successors(name).filter(|s| *s != END) {
                    if let Some(count) = remaining.get_mut(successor) {
                        *count = count.saturating_sub(1);
                        if *count == 0 {
                            next.insert(successor.to_string());
                        }
                    }
                }
            }
            frontier = next.into_iter().collect();
        }

        if completed != graph.node_count() {
            return Err(ExecutionError::Internal {
                message: format!(
                    "graph '{}' stopped after {} of {} nodes",
                    graph.name(),
                    completed,
                    graph.node_count()
                ),
            });
        }

        Ok((state, step))
    }

    /// Dispatch one frontier against a shared snapshot and collect every update.
    async fn run_step(
        &self,
        graph: &CompiledGraph,
        snapshot: StateSnapshot,
        nodes: &[String],
        semaphore: &Arc<Semaphore>,
    ) -> Result<Vec<(String, StateUpdate)>, ExecutionError> {
        let mut tasks = JoinSet::new();
        let mut names = HashMap::with_capacity(nodes.len());

        for name in nodes {
            let runner = graph
                .node(name)
                .map(NodeAction::runner)
                .ok_or_else(|| ExecutionError::Internal {
                    message: format!("node '{}' is scheduled but not registered", name),
                })?;
            let snapshot = snapshot.clone();
            let semaphore = Arc::clone(semaphore);
            let span = tracing::debug_span!("node", node = %name);

            let handle = tasks.spawn(
                async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| NodeError::failed(format!("concurrency limiter closed: {}", e)))?;
                    let clock = Instant::now();
                    let update = runner.run(snapshot).await?;
                    Ok::<_, NodeError>((update, clock.elapsed()))
                }
                .instrument(span),
            );
            names.insert(handle.id(), name.clone());
        }

        let mut updates = Vec::with_capacity(nodes.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, outcome),
                Err(join_error) => (join_error.id(), Err(join_failure(join_error))),
            };
            let name = names.remove(&id).ok_or_else(|| ExecutionError::Internal {
                message: "finished task does not belong to this step".to_string(),
            })?;

            match outcome {
                Ok((update, duration)) => {
                    log_completed(&name, &update, duration);
                    updates.push((name, update));
                }
                Err(source) => {
                    NodeFailed {
                        node: &name,
                        error: &source,
                    }
                    .log();
                    tasks.abort_all();
                    return Err(ExecutionError::NodeExecution { node: name, source });
                }
            }
        }

        updates.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(updates)
    }
}

fn log_completed(node: &str, update: &StateUpdate, duration: Duration) {
    NodeCompleted {
        node,
        fields_written: update.len(),
        duration,
    }
    .log();
}

fn join_failure(error: JoinError) -> NodeError {
    if error.is_panic() {
        NodeError::Panicked {
            message: panic_message(error.into_panic()),
        }
    } else {
        NodeError::failed(format!("node task did not finish: {}", error))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown panic payload".to_string()),
    }
}
