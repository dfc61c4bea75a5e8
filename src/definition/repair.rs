//! Boundary repair.
//!
//! Every definition the designer emits or loads must contain exactly one
//! start node and at least one end node, both wired into the graph. The
//! repair pass is idempotent: running it on an already-valid definition
//! returns it unchanged, byte for byte.

use ahash::AHashSet;

use super::model::{GraphDefinition, GraphEdge, GraphNode, NodeType, Position};

const START_REPAIR_POSITION: Position = Position { x: 220.0, y: 220.0 };
const END_REPAIR_POSITION: Position = Position { x: 820.0, y: 220.0 };

/// Repairs a definition so that start and end nodes exist and are wired.
pub fn ensure_boundary_nodes(definition: &GraphDefinition) -> GraphDefinition {
    let mut repaired = definition.clone();
    sanitize(&mut repaired);

    let node_ids: AHashSet<String> = repaired.nodes.iter().map(|node| node.id.clone()).collect();

    let existing_start = repaired.start_node().map(|start| start.id.clone());
    let start_id = match existing_start {
        Some(id) => id,
        None => {
            let id = free_node_id(&node_ids, "start");
            let mut start = GraphNode::new(id.clone(), NodeType::Start);
            start.position = Some(START_REPAIR_POSITION);
            repaired.nodes.insert(0, start);
            id
        }
    };

    let existing_end = repaired.end_nodes().first().map(|end| end.id.clone());
    let end_id = match existing_end {
        Some(id) => id,
        None => {
            let node_ids: AHashSet<String> =
                repaired.nodes.iter().map(|node| node.id.clone()).collect();
            let id = free_node_id(&node_ids, "end");
            let mut end = GraphNode::new(id.clone(), NodeType::End);
            end.position = Some(END_REPAIR_POSITION);
            repaired.nodes.push(end);
            id
        }
    };

    let middle_ids: Vec<String> = repaired
        .nodes
        .iter()
        .filter(|node| !node.node_type.is_boundary())
        .map(|node| node.id.clone())
        .collect();

    if repaired.outgoing_edges(&start_id).is_empty() {
        let target = middle_ids.first().cloned().unwrap_or_else(|| end_id.clone());
        push_repair_edge(&mut repaired, &start_id, &target);
    }

    if repaired.incoming_edges(&end_id).is_empty() {
        let source = middle_ids
            .iter()
            .find(|id| repaired.outgoing_edges(id).is_empty())
            .cloned()
            .or_else(|| middle_ids.last().cloned())
            .unwrap_or_else(|| start_id.clone());
        if !repaired
            .edges
            .iter()
            .any(|edge| edge.source == source && edge.target == end_id)
        {
            push_repair_edge(&mut repaired, &source, &end_id);
        }
    }

    repaired.start_node_id = Some(start_id);
    repaired
}

/// Drops nodes with blank or duplicate ids and edges whose endpoints do not
/// survive.
fn sanitize(definition: &mut GraphDefinition) {
    let mut seen: AHashSet<String> = AHashSet::new();
    definition.nodes.retain(|node| {
        let id = node.id.trim();
        !id.is_empty() && seen.insert(id.to_string())
    });
    let node_ids: AHashSet<&str> = definition.nodes.iter().map(|node| node.id.as_str()).collect();
    definition.edges.retain(|edge| {
        node_ids.contains(edge.source.as_str())
            && node_ids.contains(edge.target.as_str())
            && edge.source != edge.target
    });
}

fn push_repair_edge(definition: &mut GraphDefinition, source: &str, target: &str) {
    let id = free_edge_id(definition, source, target);
    let priority = definition.edges.len() as i64 + 1;
    definition
        .edges
        .push(GraphEdge::new(id, source.to_string(), target.to_string(), priority));
}

/// `e_{source}_{target}`, with a numeric suffix when that id is taken.
pub fn free_edge_id(definition: &GraphDefinition, source: &str, target: &str) -> String {
    let base = format!("e_{source}_{target}");
    if definition.edge(&base).is_none() {
        return base;
    }
    let mut suffix = 2usize;
    loop {
        let candidate = format!("{base}_{suffix}");
        if definition.edge(&candidate).is_none() {
            return candidate;
        }
        suffix += 1;
    }
}

fn free_node_id(taken: &AHashSet<String>, base: &str) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut suffix = 2usize;
    loop {
        let candidate = format!("{base}_{suffix}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
