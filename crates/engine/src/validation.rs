//! Static graph validation
//!
//! Checks the structural invariants a graph must satisfy before a run may
//! start. All violations are collected, not just the first. Unknown node
//! *types* are deliberately not validation errors: the registry resolves
//! them to a fallback at run time so a graph with version skew still runs
//! as far as possible.

use std::collections::{HashMap, HashSet};

use crate::graph::NodeGraph;

/// Validation error with location context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No node has `is_start_node` set
    MissingStartNode,
    /// More than one node has `is_start_node` set
    MultipleStartNodes,
    /// No node has `is_end_node` set
    MissingEndNode,
    /// A connection endpoint references a node id absent from the graph
    UnknownNode { node_id: String },
    /// A non-start node has no incoming connection
    UnconnectedInput { node_id: String },
    /// A non-end node has no outgoing connection
    DeadEndNode { node_id: String },
    /// Two connections target the same input port of the same node
    FanInConflict { node_id: String, port: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingStartNode => write!(f, "no node marked as start node"),
            Self::MultipleStartNodes => write!(f, "more than one node marked as start node"),
            Self::MissingEndNode => write!(f, "no node marked as end node"),
            Self::UnknownNode { node_id } => {
                write!(f, "connection references unknown node '{}'", node_id)
            }
            Self::UnconnectedInput { node_id } => {
                write!(f, "node '{}' has no incoming connection", node_id)
            }
            Self::DeadEndNode { node_id } => {
                write!(f, "node '{}' has no outgoing connection", node_id)
            }
            Self::FanInConflict { node_id, port } => {
                write!(
                    f,
                    "input port '{}' of node '{}' has multiple incoming connections",
                    port, node_id
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a graph against the pre-run invariants.
///
/// Returns all violations found; an empty vec means the graph may run.
pub fn validate_graph(graph: &NodeGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_start_end_markers(graph, &mut errors);
    validate_connection_references(graph, &mut errors);
    validate_connectivity(graph, &mut errors);
    validate_fan_in(graph, &mut errors);

    errors
}

/// Exactly one start node, at least one end-marked node.
fn validate_start_end_markers(graph: &NodeGraph, errors: &mut Vec<ValidationError>) {
    match graph.start_nodes().len() {
        0 => errors.push(ValidationError::MissingStartNode),
        1 => {}
        _ => errors.push(ValidationError::MultipleStartNodes),
    }

    if graph.end_nodes().is_empty() {
        errors.push(ValidationError::MissingEndNode);
    }
}

/// Every connection endpoint must name an existing node.
fn validate_connection_references(graph: &NodeGraph, errors: &mut Vec<ValidationError>) {
    let mut reported: HashSet<&str> = HashSet::new();
    for conn in &graph.connections {
        for node_id in [conn.from_node.as_str(), conn.to_node.as_str()] {
            if !graph.nodes.contains_key(node_id) && reported.insert(node_id) {
                errors.push(ValidationError::UnknownNode {
                    node_id: node_id.to_string(),
                });
            }
        }
    }
}

/// Non-start nodes need an incoming connection; non-end nodes an outgoing one.
fn validate_connectivity(graph: &NodeGraph, errors: &mut Vec<ValidationError>) {
    let mut node_ids: Vec<&str> = graph.nodes.keys().map(|k| k.as_str()).collect();
    node_ids.sort();

    for node_id in node_ids {
        let node = &graph.nodes[node_id];
        if !node.is_start() && graph.incoming(node_id).next().is_none() {
            errors.push(ValidationError::UnconnectedInput {
                node_id: node_id.to_string(),
            });
        }
        if !node.is_end() && graph.outgoing(node_id).next().is_none() {
            errors.push(ValidationError::DeadEndNode {
                node_id: node_id.to_string(),
            });
        }
    }
}

/// Reject multiple connections into one input port. The engine would have
/// to pick a winner silently; an explicit error is safer.
fn validate_fan_in(graph: &NodeGraph, errors: &mut Vec<ValidationError>) {
    let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
    for conn in &graph.connections {
        *seen
            .entry((conn.to_node.as_str(), conn.to_input.as_str()))
            .or_insert(0) += 1;
    }

    let mut conflicts: Vec<(&str, &str)> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(key, _)| key)
        .collect();
    conflicts.sort();

    for (node_id, port) in conflicts {
        errors.push(ValidationError::FanInConflict {
            node_id: node_id.to_string(),
            port: port.to_string(),
        });
    }
}
