// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Compile-time validation of graph structure.
//!
//! # Validation Pipeline
//!
//! 1. **Node names**: unique, and not one of the reserved markers
//! 2. **Edge references**: both endpoints exist, no edge into `START` or out
//!    of `END`, no duplicate edges
//! 3. **Field declarations**: every declared read and write is in the schema,
//!    and sub-graph mapping rows join fields of compatible kinds
//! 4. **Topology**: an entry edge exists, every node is reachable from
//!    `START`, every node can reach `END`, and the graph is acyclic
//!
//! Stage 4 needs a structurally sound edge set, so it only runs when stages
//! 1 and 2 found nothing. Field issues do not block it.
//!
//! ## Cycle Detection
//! Depth-first search with an explicit recursion stack. A back edge to a node
//! still on the stack closes a cycle; the reported path runs from that node
//! around to itself, e.g. `a -> b -> c -> a`.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::errors::{GraphValidationError, ValidationIssue};
use crate::graph::state_graph::StateGraph;
use crate::graph::{NodeAction, SubgraphAdapter, END, START};

/// Adjacency computed during validation, keyed by node name. `START` and
/// `END` appear as keys too.
#[derive(Debug, Clone, Default)]
pub(crate) struct Topology {
    pub predecessors: BTreeMap<String, BTreeSet<String>>,
    pub successors: BTreeMap<String, BTreeSet<String>>,
}

pub(crate) fn validate_graph(graph: &StateGraph) -> Result<Topology, GraphValidationError> {
    let mut structural = Vec::new();
    structural.extend(validate_node_names(graph));
    structural.extend(validate_edge_references(graph));

    let mut issues = structural.clone();
    issues.extend(validate_field_declarations(graph));

    let mut topology = None;
    if structural.is_empty() {
        let built = build_topology(graph);
        issues.extend(validate_reachability(graph, &built));
        issues.extend(validate_acyclic(&built));
        topology = Some(built);
    }

    match topology {
        Some(topology) if issues.is_empty() => Ok(topology),
        _ => Err(GraphValidationError {
            graph: graph.name.clone(),
            issues,
        }),
    }
}

fn is_marker(name: &str) -> bool {
    name == START || name == END
}

fn validate_node_names(graph: &StateGraph) -> Vec<ValidationIssue> {
    let mut seen = HashSet::new();
    let mut issues = Vec::new();

    for node in &graph.nodes {
        if is_marker(&node.name) {
            issues.push(ValidationIssue::ReservedNodeName {
                node: node.name.clone(),
            });
        } else if !seen.insert(node.name.as_str()) {
            issues.push(ValidationIssue::DuplicateNode {
                node: node.name.clone(),
            });
        }
    }

    issues
}

fn validate_edge_references(graph: &StateGraph) -> Vec<ValidationIssue> {
    let names: HashSet<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    let mut seen = HashSet::new();
    let mut issues = Vec::new();

    for (from, to) in &graph.edges {
        if to == START {
            issues.push(ValidationIssue::EdgeIntoStart { from: from.clone() });
            continue;
        }
        if from == END {
            issues.push(ValidationIssue::EdgeFromEnd { to: to.clone() });
            continue;
        }
        for endpoint in [from, to] {
            if !is_marker(endpoint) && !names.contains(endpoint.as_str()) {
                issues.push(ValidationIssue::UnknownEdgeEndpoint {
                    from: from.clone(),
                    to: to.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        if !seen.insert((from.as_str(), to.as_str())) {
            issues.push(ValidationIssue::DuplicateEdge {
                from: from.clone(),
                to: to.clone(),
            });
        }
    }

    issues
}

fn validate_field_declarations(graph: &StateGraph) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for node in &graph.nodes {
        for field in node.action.declared_reads() {
            if !graph.schema.contains(&field) {
                issues.push(ValidationIssue::UndeclaredRead {
                    node: node.name.clone(),
                    field,
                });
            }
        }
        for field in node.action.declared_writes() {
            if !graph.schema.contains(&field) {
                issues.push(ValidationIssue::UndeclaredWrite {
                    node: node.name.clone(),
                    field,
                });
            }
        }
        if let NodeAction::Subgraph(adapter) = &node.action {
            issues.extend(validate_mapped_kinds(graph, &node.name, adapter));
        }
    }

    issues
}

/// Mapping rows whose outer field is undeclared are already reported above
fn validate_mapped_kinds(
    graph: &StateGraph,
    node: &str,
    adapter: &SubgraphAdapter,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for mapping in adapter.inputs().iter().chain(adapter.outputs()) {
        let outer_kind = graph.schema.field(&mapping.outer).map(|spec| spec.kind);
        let inner_kind = adapter.inner_kind(mapping);
        if let (Some(outer_kind), Some(inner_kind)) = (outer_kind, inner_kind) {
            if !outer_kind.compatible_with(inner_kind) {
                issues.push(ValidationIssue::MappedKindMismatch {
                    node: node.to_string(),
                    outer: mapping.outer.clone(),
                    inner: mapping.inner.clone(),
                    outer_kind,
                    inner_kind,
                });
            }
        }
    }

    issues
}

fn build_topology(graph: &StateGraph) -> Topology {
    let mut topology = Topology::default();

    for name in [START, END]
        .into_iter()
        .chain(graph.nodes.iter().map(|n| n.name.as_str()))
    {
        topology.predecessors.entry(name.to_string()).or_default();
        topology.successors.entry(name.to_string()).or_default();
    }

    for (from, to) in &graph.edges {
        if let Some(successors) = topology.successors.get_mut(from) {
            successors.insert(to.clone());
        }
        if let Some(predecessors) = topology.predecessors.get_mut(to) {
            predecessors.insert(from.clone());
        }
    }

    topology
}

/// Names reachable from `origin` following `adjacency`
fn reachable_from<'a>(
    origin: &'a str,
    adjacency: &'a BTreeMap<String, BTreeSet<String>>,
) -> HashSet<&'a str> {
    let mut visited = HashSet::from([origin]);
    let mut queue = VecDeque::from([origin]);

    while let Some(current) = queue.pop_front() {
        if let Some(next) = adjacency.get(current) {
            for neighbor in next {
                if visited.insert(neighbor.as_str()) {
                    queue.push_back(neighbor.as_str());
                }
            }
        }
    }

    visited
}

fn validate_reachability(graph: &StateGraph, topology: &Topology) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if topology
        .successors
        .get(START)
        .map_or(true, BTreeSet::is_empty)
    {
        issues.push(ValidationIssue::MissingEntry);
    }

    let from_start = reachable_from(START, &topology.successors);
    let to_end = reachable_from(END, &topology.predecessors);

    for node in &graph.nodes {
        if !from_start.contains(node.name.as_str()) {
            issues.push(ValidationIssue::Unreachable {
                node: node.name.clone(),
            });
        }
        if !to_end.contains(node.name.as_str()) {
            issues.push(ValidationIssue::NoPathToEnd {
                node: node.name.clone(),
            });
        }
    }

    issues
}

fn validate_acyclic(topology: &Topology) -> Vec<ValidationIssue> {
    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for node in topology.successors.keys() {
        if !visited.contains(node.as_str()) {
            if let Some(cycle) = dfs_cycle_detection(
                node,
                &topology.successors,
                &mut visited,
                &mut rec_stack,
                &mut path,
            ) {
                return vec![ValidationIssue::Cycle { path: cycle }];
            }
        }
    }

    Vec::new()
}

fn dfs_cycle_detection<'a>(
    node: &'a str,
    graph: &'a BTreeMap<String, BTreeSet<String>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(node) {
        for neighbor in neighbors {
            let neighbor = neighbor.as_str();
            if !visited.contains(neighbor) {
                if let Some(cycle) = dfs_cycle_detection(neighbor, graph, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(neighbor) {
                let cycle_start = path.iter().position(|n| *n == neighbor).unwrap_or(0);
                let mut cycle: Vec<String> = path[cycle_start..].iter().map(|n| n.to_string()).collect();
                cycle.push(neighbor.to_string());
                return Some(cycle);
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FnNode;
    use crate::state::{FieldKind, Reducer, StateSchema, StateUpdate};

    fn schema() -> StateSchema {
        StateSchema::new("test")
            .declare("value", FieldKind::Text, Reducer::Overwrite)
            .unwrap()
    }

    fn noop() -> FnNode {
        FnNode::new(|_| Ok(StateUpdate::new()))
    }

    fn graph_with(nodes: &[&str], edges: &[(&str, &str)]) -> StateGraph {
        let mut graph = StateGraph::new("test", schema());
        for node in nodes {
            graph.add_node(*node, noop());
        }
        for (from, to) in edges {
            graph.add_edge(*from, *to);
        }
        graph
    }

    fn issues(graph: &StateGraph) -> Vec<ValidationIssue> {
        validate_graph(graph).unwrap_err().issues
    }

    #[test]
    fn test_valid_linear_chain() {
        let graph = graph_with(&["a", "b"], &[(START, "a"), ("a", "b"), ("b", END)]);
        let topology = validate_graph(&graph).unwrap();

        assert!(topology.predecessors["a"].contains(START));
        assert!(topology.successors["b"].contains(END));
    }

    #[test]
    fn test_valid_diamond() {
        let graph = graph_with(
            &["a", "b", "c", "d"],
            &[(START, "a"), ("a", "b"), ("a", "c"), ("b", "d"), ("c", "d"), ("d", END)],
        );
        let topology = validate_graph(&graph).unwrap();
        assert_eq!(topology.predecessors["d"].len(), 2);
    }

    #[test]
    fn test_duplicate_and_reserved_names() {
        let graph = graph_with(&["a", "a", START], &[(START, "a"), ("a", END)]);
        let found = issues(&graph);

        assert!(found.contains(&ValidationIssue::DuplicateNode { node: "a".to_string() }));
        assert!(found.contains(&ValidationIssue::ReservedNodeName { node: START.to_string() }));
    }

    #[test]
    fn test_unknown_endpoint() {
        let graph = graph_with(&["a"], &[(START, "a"), ("a", "ghost"), ("a", END)]);
        let found = issues(&graph);

        assert_eq!(
            found,
            vec![ValidationIssue::UnknownEdgeEndpoint {
                from: "a".to_string(),
                to: "ghost".to_string(),
                missing: "ghost".to_string(),
            }]
        );
    }

    #[test]
    fn test_marker_misuse_and_duplicate_edges() {
        let graph = graph_with(
            &["a"],
            &[(START, "a"), ("a", START), (END, "a"), ("a", END), ("a", END)],
        );
        let found = issues(&graph);

        assert!(found.contains(&ValidationIssue::EdgeIntoStart { from: "a".to_string() }));
        assert!(found.contains(&ValidationIssue::EdgeFromEnd { to: "a".to_string() }));
        assert!(found.contains(&ValidationIssue::DuplicateEdge {
            from: "a".to_string(),
            to: END.to_string(),
        }));
    }

    #[test]
    fn test_missing_entry() {
        let graph = graph_with(&["a"], &[("a", END)]);
        let found = issues(&graph);

        assert!(found.contains(&ValidationIssue::MissingEntry));
        assert!(found.contains(&ValidationIssue::Unreachable { node: "a".to_string() }));
    }

    #[test]
    fn test_unreachable_and_dangling_nodes() {
        let graph = graph_with(
            &["a", "orphan", "dangling"],
            &[(START, "a"), ("a", END), ("orphan", END), ("a", "dangling")],
        );
        let found = issues(&graph);

        assert_eq!(
            found,
            vec![
                ValidationIssue::Unreachable { node: "orphan".to_string() },
                ValidationIssue::NoPathToEnd { node: "dangling".to_string() },
            ]
        );
    }

    #[test]
    fn test_cycle_detected_with_path() {
        let graph = graph_with(
            &["a", "b", "c"],
            &[(START, "a"), ("a", "b"), ("b", "c"), ("c", "a"), ("c", END)],
        );
        let found = issues(&graph);

        assert_eq!(found.len(), 1);
        match &found[0] {
            ValidationIssue::Cycle { path } => {
                assert_eq!(path.first(), path.last());
                assert_eq!(path.len(), 4);
                for node in ["a", "b", "c"] {
                    assert!(path.iter().any(|n| n == node));
                }
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_loop_is_cycle() {
        let graph = graph_with(&["a"], &[(START, "a"), ("a", "a"), ("a", END)]);
        let found = issues(&graph);

        assert_eq!(
            found,
            vec![ValidationIssue::Cycle {
                path: vec!["a".to_string(), "a".to_string()],
            }]
        );
    }

    #[test]
    fn test_undeclared_fields() {
        let mut graph = StateGraph::new("test", schema());
        graph
            .add_node(
                "a",
                noop().reads(["value", "missing_in"]).writes(["missing_out"]),
            )
            .add_edge(START, "a")
            .add_edge("a", END);
        let found = issues(&graph);

        assert_eq!(
            found,
            vec![
                ValidationIssue::UndeclaredRead {
                    node: "a".to_string(),
                    field: "missing_in".to_string(),
                },
                ValidationIssue::UndeclaredWrite {
                    node: "a".to_string(),
                    field: "missing_out".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_structural_errors_skip_topology_checks() {
        // 'b' would also be unreachable, but the unknown edge stops stage 4
        let graph = graph_with(&["a", "b"], &[(START, "a"), ("a", "nowhere"), ("a", END)]);
        let found = issues(&graph);

        assert_eq!(found.len(), 1);
        assert!(matches!(found[0], ValidationIssue::UnknownEdgeEndpoint { .. }));
    }

    fn sequence_subgraph() -> SubgraphAdapter {
        let inner_schema = StateSchema::new("inner")
            .declare("items", FieldKind::Sequence, Reducer::Overwrite)
            .unwrap()
            .declare("anything", FieldKind::Any, Reducer::Overwrite)
            .unwrap();
        let mut inner = StateGraph::new("inner", inner_schema);
        inner
            .add_node("a", noop())
            .add_edge(START, "a")
            .add_edge("a", END);

        SubgraphAdapter::builder(inner.compile().unwrap())
            .input("value", "items")
            .output("anything", "value")
            .build()
            .unwrap()
    }

    #[test]
    fn test_mapped_kind_mismatch() {
        let mut graph = StateGraph::new("test", schema());
        graph
            .add_subgraph("nested", sequence_subgraph())
            .add_edge(START, "nested")
            .add_edge("nested", END);
        let found = issues(&graph);

        // The Any-typed output row passes; only the text -> sequence input fails
        assert_eq!(
            found,
            vec![ValidationIssue::MappedKindMismatch {
                node: "nested".to_string(),
                outer: "value".to_string(),
                inner: "items".to_string(),
                outer_kind: FieldKind::Text,
                inner_kind: FieldKind::Sequence,
            }]
        );
    }

    #[test]
    fn test_matching_mapped_kinds_compile() {
        let outer_schema = StateSchema::new("outer")
            .declare("value", FieldKind::Sequence, Reducer::Overwrite)
            .unwrap();
        let mut graph = StateGraph::new("outer", outer_schema);
        graph
            .add_subgraph("nested", sequence_subgraph())
            .add_edge(START, "nested")
            .add_edge("nested", END);

        assert!(validate_graph(&graph).is_ok());
    }
}
