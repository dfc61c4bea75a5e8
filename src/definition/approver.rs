//! Approver-group normalization.
//!
//! Approval and CC nodes carry a list of approver groups; older definitions
//! only carried the flat approver fields on the node itself. Normalization
//! guarantees that every such node has at least one group, that the flat
//! fields mirror the primary group, and that group ids are unique within a
//! node.

use ahash::AHashSet;

use super::model::{ApprovalType, ApproverGroup, ApproverType, GraphNode, NodeType};

/// True for node kinds that carry approver groups.
pub fn node_carries_groups(node_type: NodeType) -> bool {
    matches!(node_type, NodeType::Approval | NodeType::Cc)
}

/// A fresh group with the manager default, named by its 1-based position.
pub fn default_group(id: impl Into<String>, index: usize) -> ApproverGroup {
    ApproverGroup {
        id: id.into(),
        name: format!("Approver group {}", index + 1),
        approver_type: ApproverType::Manager,
        approver_user_ids: Vec::new(),
        approver_roles: Vec::new(),
        approver_positions: Vec::new(),
        approver_field_key: None,
        previous_step_offset: None,
        cc_user_ids: Vec::new(),
        condition: None,
    }
}

/// Deterministic group id for the `seq`-th group created on a node.
pub fn group_id(node_id: &str, seq: usize) -> String {
    format!("{node_id}_grp_{seq}")
}

/// Repairs the group list of one node in place.
///
/// Nodes that do not carry groups are left alone. Otherwise: blank or
/// duplicate group ids are reassigned, an empty list is seeded (lifting the
/// node's flat approver fields into the first group when present), defaults
/// are filled in, and the flat fields are rewritten to mirror the primary
/// group.
pub fn ensure_node_groups(node: &mut GraphNode) {
    if !node_carries_groups(node.node_type) {
        node.approver_groups.clear();
        return;
    }

    if node.approver_groups.is_empty() {
        let mut group = default_group(group_id(&node.id, 0), 0);
        if let Some(approver_type) = node.approver_type {
            group.approver_type = approver_type;
        }
        group.approver_user_ids = node.approver_user_ids.clone();
        group.approver_roles = node.approver_roles.clone();
        group.approver_positions = node.approver_positions.clone();
        group.approver_field_key = node.approver_field_key.clone();
        group.previous_step_offset = node.previous_step_offset;
        node.approver_groups.push(group);
    }

    let mut seen: AHashSet<String> = AHashSet::new();
    let mut seq = node.approver_groups.len();
    for (index, group) in node.approver_groups.iter_mut().enumerate() {
        let id = group.id.trim();
        if id.is_empty() || seen.contains(id) {
            let mut candidate = group_id(&node.id, seq);
            while seen.contains(&candidate) {
                seq += 1;
                candidate = group_id(&node.id, seq);
            }
            seq += 1;
            group.id = candidate;
        } else if id != group.id {
            group.id = id.to_string();
        }
        seen.insert(group.id.clone());
        if group.name.trim().is_empty() {
            group.name = format!("Approver group {}", index + 1);
        }
    }

    if node.approval_type.is_none() {
        node.approval_type = Some(ApprovalType::Any);
    }
    if let Some(approval_type) = node.approval_type {
        node.approval_mode = Some(approval_type.mode());
    }
    mirror_primary_group(node);
}

/// Copies the first group's resolution fields onto the node's flat mirror.
pub fn mirror_primary_group(node: &mut GraphNode) {
    let Some(primary) = node.approver_groups.first() else {
        return;
    };
    node.approver_type = Some(primary.approver_type);
    node.approver_user_ids = primary.approver_user_ids.clone();
    node.approver_roles = primary.approver_roles.clone();
    node.approver_positions = primary.approver_positions.clone();
    node.approver_field_key = primary.approver_field_key.clone();
    node.previous_step_offset = primary.previous_step_offset;
}
