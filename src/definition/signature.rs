//! Canonical history signature of a definition.
//!
//! Undo history must not record entries for changes that are purely
//! cosmetic at the identity level: regenerated approver-group ids and
//! regenerated edge ids describe the same process. The signature serializes
//! a canonical form with those ids stripped and both lists sorted, so two
//! definitions compare equal exactly when the history should treat them as
//! the same state.

use itertools::Itertools;
use serde_json::{Value, json};

use super::model::{GraphDefinition, GraphEdge, GraphNode};

/// The canonical signature used by the undo/redo history.
pub fn history_signature(definition: &GraphDefinition) -> String {
    let nodes: Vec<Value> = definition
        .nodes
        .iter()
        .sorted_by(|a, b| a.id.cmp(&b.id))
        .map(canonical_node)
        .collect();
    let edges: Vec<Value> = definition
        .edges
        .iter()
        .map(canonical_edge)
        .sorted_by_key(edge_sort_key)
        .collect();
    let canonical = json!({
        "version": definition.version,
        "start_node_id": definition.start_node_id,
        "nodes": nodes,
        "edges": edges,
    });
    canonical.to_string()
}

fn canonical_node(node: &GraphNode) -> Value {
    let mut value = serde_json::to_value(node).unwrap_or(Value::Null);
    if let Some(groups) = value
        .get_mut("approver_groups")
        .and_then(Value::as_array_mut)
    {
        for group in groups {
            if let Some(object) = group.as_object_mut() {
                object.remove("id");
            }
        }
    }
    value
}

fn canonical_edge(edge: &GraphEdge) -> Value {
    let mut value = serde_json::to_value(edge).unwrap_or(Value::Null);
    if let Some(object) = value.as_object_mut() {
        object.remove("id");
    }
    value
}

fn edge_sort_key(edge: &Value) -> (String, String, i64, String, String, bool) {
    let text = |key: &str| {
        edge.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    (
        text("source"),
        text("target"),
        edge.get("priority").and_then(Value::as_i64).unwrap_or(0),
        edge.get("condition").map(Value::to_string).unwrap_or_default(),
        text("label"),
        edge.get("is_default").and_then(Value::as_bool).unwrap_or(false),
    )
}

/// The exact-emission signature: the serialized definition itself.
///
/// Unlike the history signature this keeps every id, because the emission
/// gate must suppress only byte-identical repeats.
pub fn emission_signature(definition: &GraphDefinition) -> String {
    serde_json::to_string(definition).unwrap_or_default()
}
