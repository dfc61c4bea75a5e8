//! Lenient hydration of a definition from untyped JSON.
//!
//! Stored templates come from several generations of the designer and from
//! hand-edited imports, so hydration never fails: unknown node types fall
//! back to `approval`, missing ids and positions are synthesized, malformed
//! conditions are dropped, and edges with blank endpoints are discarded.

use serde_json::Value;

use crate::condition::Condition;

use super::model::{
    ApprovalType, ApproverGroup, ApproverType, FieldPermission, GRAPH_VERSION, GraphDefinition,
    GraphEdge, GraphNode, NodeType, Position,
};

const FALLBACK_GRID_X: f64 = 140.0;
const FALLBACK_GRID_Y: f64 = 120.0;
const FALLBACK_GRID_X_GAP: f64 = 280.0;
const FALLBACK_GRID_Y_GAP: f64 = 160.0;

impl GraphDefinition {
    /// Hydrates a definition from arbitrary JSON without ever failing.
    pub fn from_value(raw: &Value) -> GraphDefinition {
        let object = raw.as_object();
        let version = object
            .and_then(|o| o.get("version"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(GRAPH_VERSION)
            .to_string();

        let raw_nodes = object
            .and_then(|o| o.get("nodes"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut nodes: Vec<GraphNode> = Vec::with_capacity(raw_nodes.len());
        for (index, raw_node) in raw_nodes.iter().enumerate() {
            nodes.push(hydrate_node(raw_node, index));
        }

        let raw_edges = object
            .and_then(|o| o.get("edges"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut edges: Vec<GraphEdge> = Vec::new();
        for (index, raw_edge) in raw_edges.iter().enumerate() {
            if let Some(edge) = hydrate_edge(raw_edge, index) {
                edges.push(edge);
            }
        }

        let start_node_id = object
            .and_then(|o| o.get("start_node_id"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .or_else(|| {
                nodes
                    .iter()
                    .find(|node| node.node_type == NodeType::Start)
                    .map(|node| node.id.clone())
            });

        GraphDefinition {
            version,
            start_node_id,
            nodes,
            edges,
        }
    }
}

fn hydrate_node(raw: &Value, index: usize) -> GraphNode {
    let object = raw.as_object();
    let node_type = object
        .and_then(|o| o.get("node_type").or_else(|| o.get("type")))
        .and_then(Value::as_str)
        .map(NodeType::from_raw)
        .unwrap_or_default();
    let id = trimmed_string(object.and_then(|o| o.get("id")))
        .unwrap_or_else(|| format!("{}_{}", node_type.as_str(), index + 1));

    let mut node = GraphNode::new(id, node_type);
    if let Some(name) = trimmed_string(object.and_then(|o| o.get("name"))) {
        node.name = name;
    }
    node.approval_type = object
        .and_then(|o| o.get("approval_type"))
        .and_then(Value::as_str)
        .map(ApprovalType::from_raw);
    node.approval_mode = node.approval_type.map(ApprovalType::mode);
    node.approver_type = object
        .and_then(|o| o.get("approver_type"))
        .and_then(Value::as_str)
        .map(ApproverType::from_raw);
    node.approver_user_ids = id_list(object.and_then(|o| o.get("approver_user_ids")));
    node.approver_roles = string_list(object.and_then(|o| o.get("approver_roles")));
    node.approver_positions = string_list(object.and_then(|o| o.get("approver_positions")));
    node.approver_field_key = trimmed_string(object.and_then(|o| o.get("approver_field_key")));
    node.previous_step_offset = object
        .and_then(|o| o.get("previous_step_offset"))
        .and_then(Value::as_u64)
        .map(|offset| offset as u32);
    node.cc_user_ids = id_list(object.and_then(|o| o.get("cc_user_ids")));
    node.subprocess_template_id = object
        .and_then(|o| o.get("subprocess_template_id"))
        .and_then(Value::as_i64);
    node.allow_self_approve = object.and_then(|o| o.get("allow_self_approve")).map(truthy);
    node.allow_return = object.and_then(|o| o.get("allow_return")).map(truthy);
    node.timeout_hours = object
        .and_then(|o| o.get("timeout_hours"))
        .and_then(Value::as_u64)
        .map(|hours| hours as u32);
    node.condition = object
        .and_then(|o| o.get("condition"))
        .and_then(Condition::from_value);

    if let Some(raw_groups) = object.and_then(|o| o.get("approver_groups")).and_then(Value::as_array)
    {
        for raw_group in raw_groups {
            if let Some(group) = hydrate_group(raw_group) {
                node.approver_groups.push(group);
            }
        }
    }
    if let Some(raw_permissions) = object
        .and_then(|o| o.get("field_permissions"))
        .and_then(Value::as_array)
    {
        for raw_permission in raw_permissions {
            if let Some(permission) = hydrate_permission(raw_permission) {
                node.field_permissions.push(permission.normalized());
            }
        }
    }

    node.position = object
        .and_then(|o| o.get("position"))
        .and_then(hydrate_position)
        .or_else(|| Some(fallback_position(index)));
    node
}

fn hydrate_group(raw: &Value) -> Option<ApproverGroup> {
    let object = raw.as_object()?;
    let id = trimmed_string(object.get("id")).unwrap_or_default();
    Some(ApproverGroup {
        id,
        name: trimmed_string(object.get("name")).unwrap_or_default(),
        approver_type: object
            .get("approver_type")
            .and_then(Value::as_str)
            .map(ApproverType::from_raw)
            .unwrap_or_default(),
        approver_user_ids: id_list(object.get("approver_user_ids")),
        approver_roles: string_list(object.get("approver_roles")),
        approver_positions: string_list(object.get("approver_positions")),
        approver_field_key: trimmed_string(object.get("approver_field_key")),
        previous_step_offset: object
            .get("previous_step_offset")
            .and_then(Value::as_u64)
            .map(|offset| offset as u32),
        cc_user_ids: id_list(object.get("cc_user_ids")),
        condition: object.get("condition").and_then(Condition::from_value),
    })
}

fn hydrate_permission(raw: &Value) -> Option<FieldPermission> {
    let object = raw.as_object()?;
    let field_key = trimmed_string(object.get("field_key"))?;
    Some(FieldPermission {
        field_key,
        can_view: object.get("can_view").map(truthy).unwrap_or(false),
        can_edit: object.get("can_edit").map(truthy).unwrap_or(false),
        required: object.get("required").map(truthy).unwrap_or(false),
    })
}

fn hydrate_edge(raw: &Value, index: usize) -> Option<GraphEdge> {
    let object = raw.as_object()?;
    let source = trimmed_string(object.get("source"))?;
    let target = trimmed_string(object.get("target"))?;
    let id = trimmed_string(object.get("id")).unwrap_or_else(|| format!("e_{source}_{target}"));
    Some(GraphEdge {
        id,
        source,
        target,
        priority: object
            .get("priority")
            .and_then(Value::as_i64)
            .unwrap_or(index as i64 + 1),
        condition: object.get("condition").and_then(Condition::from_value),
        is_default: object.get("is_default").map(truthy).unwrap_or(false),
        label: trimmed_string(object.get("label")),
    })
}

fn hydrate_position(raw: &Value) -> Option<Position> {
    let object = raw.as_object()?;
    let x = object.get("x").and_then(Value::as_f64)?;
    let y = object.get("y").and_then(Value::as_f64)?;
    if x.is_finite() && y.is_finite() {
        Some(Position::new(x, y))
    } else {
        None
    }
}

/// Grid slot for the `index`-th node when no stored position survives.
pub fn fallback_position(index: usize) -> Position {
    Position::new(
        FALLBACK_GRID_X + (index % 3) as f64 * FALLBACK_GRID_X_GAP,
        FALLBACK_GRID_Y + (index / 3) as f64 * FALLBACK_GRID_Y_GAP,
    )
}

fn trimmed_string(raw: Option<&Value>) -> Option<String> {
    raw.and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn string_list(raw: Option<&Value>) -> Vec<String> {
    raw.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.as_str()
                        .map(str::trim)
                        .filter(|text| !text.is_empty())
                        .map(str::to_string)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn id_list(raw: Option<&Value>) -> Vec<i64> {
    raw.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.as_i64()
                        .or_else(|| item.as_str().and_then(|text| text.trim().parse().ok()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Truthiness used for loosely-typed boolean fields: JSON `true`, non-zero
/// numbers and the strings "1", "true", "yes", "y" count as true.
fn truthy(raw: &Value) -> bool {
    match raw {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => {
            matches!(
                text.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "y"
            )
        }
        _ => false,
    }
}
