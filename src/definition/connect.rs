//! Connection legality checks.
//!
//! A connection request is checked against a fixed sequence of rules; the
//! first failing rule decides the error, so the reported reason is stable
//! regardless of how many rules would fail.

use ahash::{AHashMap, AHashSet};

use crate::error::ConnectError;

use super::model::{GraphEdge, GraphNode, NodeType};

/// Depth-first reachability over the directed edges. A node trivially
/// reaches itself.
pub fn has_path(edges: &[GraphEdge], from: &str, to: &str) -> bool {
    if from == to {
        return true;
    }
    let mut adjacency: AHashMap<&str, Vec<&str>> = AHashMap::new();
    for edge in edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }
    let mut seen: AHashSet<&str> = AHashSet::new();
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        if current == to {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        if let Some(next) = adjacency.get(current) {
            stack.extend(next.iter().copied());
        }
    }
    false
}

/// Checks whether `source -> target` may be added to `edges`.
///
/// Rule order: self-loop, end as source, start as target, duplicate edge,
/// cycle, then the source's out-degree cap. Condition nodes cap at two
/// outgoing edges, parallel splits are unlimited, every other kind allows
/// exactly one.
pub fn connection_error(
    source: &GraphNode,
    target: &GraphNode,
    edges: &[GraphEdge],
) -> Option<ConnectError> {
    if source.id == target.id {
        return Some(ConnectError::SelfLoop);
    }
    if source.node_type == NodeType::End {
        return Some(ConnectError::SourceIsEnd);
    }
    if target.node_type == NodeType::Start {
        return Some(ConnectError::TargetIsStart);
    }
    if edges
        .iter()
        .any(|edge| edge.source == source.id && edge.target == target.id)
    {
        return Some(ConnectError::DuplicateEdge {
            source_id: source.id.clone(),
            target_id: target.id.clone(),
        });
    }
    if has_path(edges, &target.id, &source.id) {
        return Some(ConnectError::WouldCreateCycle);
    }

    let out_degree = edges.iter().filter(|edge| edge.source == source.id).count();
    match source.node_type {
        NodeType::Condition => {
            if out_degree >= 2 {
                return Some(ConnectError::ConditionBranchLimit);
            }
        }
        NodeType::ParallelStart => {}
        _ => {
            if out_degree >= 1 {
                return Some(ConnectError::SingleOutgoingExceeded);
            }
        }
    }
    None
}
