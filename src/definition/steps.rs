//! Conversion between the legacy flat step list and the graph definition.
//!
//! Before `graph_v1`, templates stored an ordered list of approval steps.
//! Loading such a template turns the list into a linear chain; saving a
//! linear graph back through an older consumer extracts the steps by walking
//! from the start node.

use serde::{Deserialize, Serialize};

use super::approver::ensure_node_groups;
use super::model::{
    ApprovalType, ApproverGroup, ApproverType, FieldPermission, GraphDefinition, GraphEdge,
    GraphNode, NodeType, Position,
};

const STEP_CHAIN_Y: f64 = 180.0;
const STEP_CHAIN_X_BASE: f64 = 80.0;
const STEP_CHAIN_X_GAP: f64 = 260.0;

/// One legacy approval step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub step_no: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub approval_type: ApprovalType,
    #[serde(default)]
    pub approver_type: ApproverType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approver_user_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approver_roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approver_positions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_field_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc_user_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approver_groups: Vec<ApproverGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_permissions: Vec<FieldPermission>,
}

/// Builds the linear `start -> step_1 -> ... -> end` chain from a step list.
pub fn steps_to_definition(steps: &[WorkflowStep]) -> GraphDefinition {
    let mut nodes = Vec::with_capacity(steps.len() + 2);
    let mut edges = Vec::with_capacity(steps.len() + 1);

    let mut start = GraphNode::new("start", NodeType::Start);
    start.position = Some(Position::new(STEP_CHAIN_X_BASE, STEP_CHAIN_Y));
    nodes.push(start);

    let mut previous_id = "start".to_string();
    for (index, step) in steps.iter().enumerate() {
        let id = format!("step_{}", index + 1);
        let mut node = GraphNode::new(id.clone(), NodeType::Approval);
        if !step.name.trim().is_empty() {
            node.name = step.name.trim().to_string();
        } else {
            node.name = format!("Approval {}", index + 1);
        }
        node.approval_type = Some(step.approval_type);
        node.approval_mode = Some(step.approval_type.mode());
        node.approver_type = Some(step.approver_type);
        node.approver_user_ids = step.approver_user_ids.clone();
        node.approver_roles = step.approver_roles.clone();
        node.approver_positions = step.approver_positions.clone();
        node.approver_field_key = step.approver_field_key.clone();
        node.cc_user_ids = step.cc_user_ids.clone();
        node.approver_groups = step.approver_groups.clone();
        node.field_permissions = step
            .field_permissions
            .iter()
            .cloned()
            .map(FieldPermission::normalized)
            .collect();
        node.position = Some(Position::new(
            STEP_CHAIN_X_BASE + (index + 1) as f64 * STEP_CHAIN_X_GAP,
            STEP_CHAIN_Y,
        ));
        ensure_node_groups(&mut node);

        edges.push(GraphEdge::new(
            format!("e_{previous_id}_{id}"),
            previous_id.clone(),
            id.clone(),
            index as i64 + 1,
        ));
        previous_id = id;
        nodes.push(node);
    }

    let mut end = GraphNode::new("end", NodeType::End);
    end.position = Some(Position::new(
        STEP_CHAIN_X_BASE + (steps.len() + 1) as f64 * STEP_CHAIN_X_GAP,
        STEP_CHAIN_Y,
    ));
    nodes.push(end);
    edges.push(GraphEdge::new(
        format!("e_{previous_id}_end"),
        previous_id,
        "end".to_string(),
        steps.len() as i64 + 1,
    ));

    GraphDefinition {
        start_node_id: Some("start".to_string()),
        nodes,
        edges,
        ..GraphDefinition::default()
    }
}

/// Extracts the flat step list from a definition by walking the chain from
/// the start node.
///
/// Only approval nodes become steps; cc and other pass-through kinds are
/// skipped. The walk follows the lowest-priority outgoing edge and stops at
/// the end node, a branch it cannot linearize, or a revisited node.
pub fn extract_steps(definition: &GraphDefinition) -> Vec<WorkflowStep> {
    let mut steps = Vec::new();
    let Some(start) = definition.start_node() else {
        return steps;
    };

    let mut visited = ahash::AHashSet::new();
    let mut current = start.id.clone();
    loop {
        if !visited.insert(current.clone()) {
            break;
        }
        let outgoing = definition.outgoing_edges(&current);
        let Some(edge) = outgoing.first() else {
            break;
        };
        let Some(node) = definition.node(&edge.target) else {
            break;
        };
        if node.node_type == NodeType::End {
            break;
        }
        if node.node_type == NodeType::Approval {
            steps.push(node_to_step(node, steps.len() as u32 + 1));
        }
        current = node.id.clone();
    }
    steps
}

fn node_to_step(node: &GraphNode, step_no: u32) -> WorkflowStep {
    WorkflowStep {
        step_no,
        name: node.name.clone(),
        approval_type: node.approval_type.unwrap_or_default(),
        approver_type: node.approver_type.unwrap_or_default(),
        approver_user_ids: node.approver_user_ids.clone(),
        approver_roles: node.approver_roles.clone(),
        approver_positions: node.approver_positions.clone(),
        approver_field_key: node.approver_field_key.clone(),
        cc_user_ids: node.cc_user_ids.clone(),
        approver_groups: node.approver_groups.clone(),
        field_permissions: node.field_permissions.clone(),
    }
}
