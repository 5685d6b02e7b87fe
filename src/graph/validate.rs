//! Graph validation.

use std::collections::{HashMap, HashSet};

use crate::error::{LogicError, Result};

use super::{Graph, Node, NodeKind};

/// Validate a graph (recursively) before instantiation.
///
/// Checks:
/// - Node ids are unique within each graph
/// - Every composite carries an inner graph, which is itself valid
/// - Explicit `port` positions don't collide
/// - Every edge resolves to nodes of the same graph and to ports they have
/// - No input port is driven by more than one edge
pub fn validate_graph(graph: &Graph) -> Result<()> {
    let mut index: HashMap<&str, &Node> = HashMap::with_capacity(graph.nodes.len());

    for node in &graph.nodes {
        if index.insert(node.id.as_str(), node).is_some() {
            return Err(LogicError::DuplicateNode {
                id: node.id.clone(),
            });
        }

        if node.kind == NodeKind::Composite {
            let inner = node
                .inner_graph
                .as_ref()
                .ok_or_else(|| LogicError::MissingInnerGraph {
                    node: node.id.clone(),
                })?;
            validate_graph(inner).map_err(|e| LogicError::in_inner_graph(&node.id, e))?;
        }
    }

    check_port_positions(graph, NodeKind::Input, "input")?;
    check_port_positions(graph, NodeKind::Output, "output")?;

    let mut driven: HashSet<(&str, usize)> = HashSet::with_capacity(graph.edges.len());
    for (i, edge) in graph.edges.iter().enumerate() {
        let to = index
            .get(edge.to.as_str())
            .ok_or_else(|| LogicError::UnknownNode {
                edge: i,
                node: edge.to.clone(),
            })?;
        let from = index
            .get(edge.from.as_str())
            .ok_or_else(|| LogicError::UnknownNode {
                edge: i,
                node: edge.from.clone(),
            })?;

        if edge.to_port >= to.input_count() {
            return Err(LogicError::EdgePortOutOfRange {
                edge: i,
                node: to.id.clone(),
                direction: "input",
                port: edge.to_port,
                available: to.input_count(),
            });
        }
        if edge.from_port >= from.output_count() {
            return Err(LogicError::EdgePortOutOfRange {
                edge: i,
                node: from.id.clone(),
                direction: "output",
                port: edge.from_port,
                available: from.output_count(),
            });
        }

        if !driven.insert((edge.to.as_str(), edge.to_port)) {
            return Err(LogicError::InputAlreadyDriven {
                node: edge.to.clone(),
                port: edge.to_port,
            });
        }
    }

    Ok(())
}

fn check_port_positions(graph: &Graph, kind: NodeKind, direction: &'static str) -> Result<()> {
    let mut seen = HashSet::new();
    for node in graph.nodes.iter().filter(|n| n.kind == kind) {
        if let Some(port) = node.port {
            if !seen.insert(port) {
                return Err(LogicError::DuplicatePort {
                    node: node.id.clone(),
                    direction,
                    port,
                });
            }
        }
    }
    Ok(())
}
