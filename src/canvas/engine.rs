//! The interactive canvas state engine.
//!
//! [`CanvasEngine`] owns the editable node and edge arrays, the selection,
//! and an explicit [`EngineState`]. Every mutating operation schedules a
//! debounced emission; the owner drives time by calling
//! [`CanvasEngine::poll_emission`], which produces at most one repaired,
//! signature-gated definition per debounce window. Definitions arriving from
//! outside go through [`CanvasEngine::apply_external_definition`], which
//! drops echoes of the engine's own recent emissions.

use std::collections::VecDeque;

use crate::condition::Condition;
use crate::definition::{
    ApprovalType, ApproverGroup, FieldPermission, GraphDefinition, GraphEdge, GraphNode, NodeType,
    Position, connection_error, default_group, emission_signature, ensure_boundary_nodes,
    ensure_node_groups, group_id, mirror_primary_group,
};
use crate::error::{CanvasError, ConnectError};
use crate::layout::layout_nodes_by_flow;

use super::clock::Clock;
use super::element::{CanvasNode, Selection};

/// Milliseconds between the last edit and the emission it triggers.
pub const DEBOUNCE_MS: u64 = 140;
/// How many of the engine's own emission signatures are remembered for echo
/// detection.
pub const EMITTED_RING_CAP: usize = 80;

const CONDITION_BRANCH_X_GAP: f64 = 320.0;
const CONDITION_BRANCH_Y_GAP: f64 = 120.0;
const APPEND_MIN_X_GAP: f64 = 140.0;
const APPEND_X_GAP: f64 = 280.0;

/// What the engine is doing right now.
///
/// Exactly one state holds at a time; the transitions replace the original
/// designer's tangle of boolean and ref flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    /// A node is being dragged; emission is suppressed until the drag ends.
    Dragging { node_id: String },
    /// An emission is due once the clock reaches `due_at_ms`.
    PendingEmit { due_at_ms: u64 },
    /// An external definition is being applied; edits are not expected.
    Resyncing,
}

pub struct CanvasEngine {
    nodes: Vec<CanvasNode>,
    edges: Vec<GraphEdge>,
    selection: Selection,
    state: EngineState,
    clock: Box<dyn Clock>,
    runtime_seq: u64,
    emitted_signatures: VecDeque<String>,
    last_emitted_signature: String,
}

impl CanvasEngine {
    /// Loads a definition onto a fresh canvas.
    ///
    /// The definition is boundary-repaired first, and its signature is
    /// recorded so loading alone never produces an emission.
    pub fn new(initial: GraphDefinition, clock: Box<dyn Clock>) -> Self {
        let repaired = ensure_boundary_nodes(&initial);
        let signature = emission_signature(&repaired);
        let mut engine = Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            selection: Selection::None,
            state: EngineState::Idle,
            clock,
            runtime_seq: 1,
            emitted_signatures: VecDeque::new(),
            last_emitted_signature: signature.clone(),
        };
        engine.load(&repaired);
        engine.remember_signature(signature);
        engine
    }

    pub fn nodes(&self) -> &[CanvasNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    // ---- node operations ----

    /// Places a new node of the given kind at a free position.
    pub fn add_node(
        &mut self,
        node_type: NodeType,
        position: Position,
    ) -> Result<String, CanvasError> {
        if node_type == NodeType::Start && self.find_node_of_type(NodeType::Start).is_some() {
            return Err(CanvasError::StartNodeExists);
        }
        let id = self.allocate_runtime_id(node_type.as_str());
        let mut data = GraphNode::new(id.clone(), node_type);
        ensure_node_groups(&mut data);
        self.nodes.push(CanvasNode { data, position });
        self.selection = Selection::Node(id.clone());
        self.schedule_emit();
        Ok(id)
    }

    /// Adds a node of the given kind relative to the current selection.
    ///
    /// With a non-end node selected the new node is appended after it;
    /// otherwise it is dropped onto a free grid slot.
    pub fn insert_node(&mut self, node_type: NodeType) -> Result<String, CanvasError> {
        if let Some(anchor) = self.selection.node_id().map(str::to_string) {
            let appendable = self
                .node(&anchor)
                .is_some_and(|node| node.data.node_type != NodeType::End);
            if appendable && node_type != NodeType::Start {
                return self.append_node_after(&anchor, node_type);
            }
        }
        let position = crate::definition::fallback_position(self.nodes.len());
        self.add_node(node_type, position)
    }

    /// Inserts a new node after `source_id`.
    ///
    /// For a source with a single outgoing edge the new node is spliced into
    /// that edge, preserving the out-degree-1 invariant. For branching
    /// sources (condition, parallel split) a new fan-out edge is created
    /// instead, placed above or below the existing branches.
    pub fn append_node_after(
        &mut self,
        source_id: &str,
        node_type: NodeType,
    ) -> Result<String, CanvasError> {
        if node_type == NodeType::Start {
            return Err(CanvasError::AppendTargetIsStart);
        }
        let source = self
            .node(source_id)
            .ok_or_else(|| CanvasError::NodeNotFound(source_id.to_string()))?;
        if source.data.node_type == NodeType::End {
            return Err(CanvasError::AppendAfterEnd);
        }
        let source_position = source.position;
        let source_type = source.data.node_type;
        let outgoing: Vec<usize> = self
            .edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.source == source_id)
            .map(|(index, _)| index)
            .collect();

        if !source_type.allows_branching() && outgoing.len() > 1 {
            return Err(ConnectError::SingleOutgoingExceeded.into());
        }

        let id = self.allocate_runtime_id(node_type.as_str());
        let mut data = GraphNode::new(id.clone(), node_type);
        ensure_node_groups(&mut data);

        if !source_type.allows_branching() && outgoing.len() == 1 {
            // Splice into the existing edge.
            let edge_index = outgoing[0];
            let old_target = self.edges[edge_index].target.clone();
            let (target_x, target_y) = self
                .node(&old_target)
                .map(|node| (node.position.x, node.position.y))
                .unwrap_or((source_position.x + APPEND_X_GAP, source_position.y));
            let position = Position::new(
                source_position.x + APPEND_MIN_X_GAP.max((target_x - source_position.x) / 2.0),
                (source_position.y + target_y) / 2.0,
            );
            self.edges[edge_index].target = id.clone();
            self.nodes.push(CanvasNode { data, position });
            self.push_edge(&id, &old_target, false);
        } else {
            let position = if source_type.allows_branching() {
                let offset = if outgoing.is_empty() {
                    -CONDITION_BRANCH_Y_GAP
                } else {
                    CONDITION_BRANCH_Y_GAP
                };
                Position::new(source_position.x + APPEND_X_GAP, source_position.y + offset)
            } else {
                Position::new(source_position.x + APPEND_X_GAP, source_position.y)
            };
            self.nodes.push(CanvasNode { data, position });
            match self.connect(source_id, &id) {
                Ok(_) => {}
                Err(error) => {
                    self.nodes.retain(|node| node.id() != id);
                    return Err(error);
                }
            }
        }

        self.selection = Selection::Node(id.clone());
        self.schedule_emit();
        Ok(id)
    }

    pub fn rename_node(&mut self, node_id: &str, name: &str) -> Result<(), CanvasError> {
        let node = self.node_mut(node_id)?;
        node.data.name = name.trim().to_string();
        self.schedule_emit();
        Ok(())
    }

    pub fn set_node_position(&mut self, node_id: &str, position: Position) -> Result<(), CanvasError> {
        let node = self.node_mut(node_id)?;
        node.position = position;
        self.schedule_emit();
        Ok(())
    }

    pub fn set_approval_type(
        &mut self,
        node_id: &str,
        approval_type: ApprovalType,
    ) -> Result<(), CanvasError> {
        let node = self.node_mut(node_id)?;
        node.data.approval_type = Some(approval_type);
        node.data.approval_mode = Some(approval_type.mode());
        self.schedule_emit();
        Ok(())
    }

    pub fn set_subprocess_template(
        &mut self,
        node_id: &str,
        template_id: Option<i64>,
    ) -> Result<(), CanvasError> {
        let node = self.node_mut(node_id)?;
        node.data.subprocess_template_id = template_id;
        self.schedule_emit();
        Ok(())
    }

    /// Behavioral options of an approval step.
    pub fn set_node_options(
        &mut self,
        node_id: &str,
        allow_self_approve: Option<bool>,
        allow_return: Option<bool>,
        timeout_hours: Option<u32>,
    ) -> Result<(), CanvasError> {
        let node = self.node_mut(node_id)?;
        node.data.allow_self_approve = allow_self_approve;
        node.data.allow_return = allow_return;
        node.data.timeout_hours = timeout_hours;
        self.schedule_emit();
        Ok(())
    }

    /// Sets or clears the skip condition of a node.
    pub fn update_node_condition(
        &mut self,
        node_id: &str,
        condition: Option<Condition>,
    ) -> Result<(), CanvasError> {
        let node = self.node_mut(node_id)?;
        node.data.condition = condition.filter(|c| !c.is_vacuous());
        self.schedule_emit();
        Ok(())
    }

    // ---- approver groups ----

    pub fn add_approver_group(&mut self, node_id: &str) -> Result<String, CanvasError> {
        let node = self.node_mut(node_id)?;
        let mut seq = node.data.approver_groups.len();
        let mut id = group_id(node_id, seq);
        while node.data.approver_groups.iter().any(|group| group.id == id) {
            seq += 1;
            id = group_id(node_id, seq);
        }
        let index = node.data.approver_groups.len();
        node.data.approver_groups.push(default_group(id.clone(), index));
        mirror_primary_group(&mut node.data);
        self.schedule_emit();
        Ok(id)
    }

    pub fn remove_approver_group(
        &mut self,
        node_id: &str,
        group_id: &str,
    ) -> Result<(), CanvasError> {
        let node = self.node_mut(node_id)?;
        if node.data.approver_groups.len() <= 1 {
            return Err(CanvasError::LastApproverGroup);
        }
        let before = node.data.approver_groups.len();
        node.data.approver_groups.retain(|group| group.id != group_id);
        if node.data.approver_groups.len() == before {
            return Err(CanvasError::GroupNotFound {
                node_id: node_id.to_string(),
                group_id: group_id.to_string(),
            });
        }
        mirror_primary_group(&mut node.data);
        self.schedule_emit();
        Ok(())
    }

    pub fn update_approver_group(
        &mut self,
        node_id: &str,
        group: ApproverGroup,
    ) -> Result<(), CanvasError> {
        let node = self.node_mut(node_id)?;
        let Some(slot) = node
            .data
            .approver_groups
            .iter_mut()
            .find(|existing| existing.id == group.id)
        else {
            return Err(CanvasError::GroupNotFound {
                node_id: node_id.to_string(),
                group_id: group.id,
            });
        };
        *slot = group;
        mirror_primary_group(&mut node.data);
        self.schedule_emit();
        Ok(())
    }

    /// Stores a field permission, enforcing required ⇒ editable ⇒ visible.
    pub fn set_field_permission(
        &mut self,
        node_id: &str,
        permission: FieldPermission,
    ) -> Result<(), CanvasError> {
        let permission = permission.normalized();
        let node = self.node_mut(node_id)?;
        match node
            .data
            .field_permissions
            .iter_mut()
            .find(|existing| existing.field_key == permission.field_key)
        {
            Some(slot) => *slot = permission,
            None => node.data.field_permissions.push(permission),
        }
        self.schedule_emit();
        Ok(())
    }

    // ---- edge operations ----

    /// Connects two nodes, enforcing the connection rules.
    ///
    /// The first branch out of a condition node is made the default branch
    /// automatically.
    pub fn connect(&mut self, source_id: &str, target_id: &str) -> Result<String, CanvasError> {
        let source = self
            .node(source_id)
            .ok_or_else(|| CanvasError::NodeNotFound(source_id.to_string()))?;
        let target = self
            .node(target_id)
            .ok_or_else(|| CanvasError::NodeNotFound(target_id.to_string()))?;
        if let Some(error) = connection_error(&source.data, &target.data, &self.edges) {
            return Err(error.into());
        }
        let make_default = source.data.node_type == NodeType::Condition
            && !self.edges.iter().any(|edge| edge.source == source_id);
        let id = self.push_edge(source_id, target_id, make_default);
        self.schedule_emit();
        Ok(id)
    }

    /// Marks one edge as its source's default branch, clearing its siblings.
    pub fn set_edge_default(&mut self, edge_id: &str) -> Result<(), CanvasError> {
        let source = self
            .edge(edge_id)
            .map(|edge| edge.source.clone())
            .ok_or_else(|| CanvasError::EdgeNotFound(edge_id.to_string()))?;
        for edge in &mut self.edges {
            if edge.source == source {
                edge.is_default = edge.id == edge_id;
            }
        }
        self.schedule_emit();
        Ok(())
    }

    pub fn update_edge_condition(
        &mut self,
        edge_id: &str,
        condition: Option<Condition>,
    ) -> Result<(), CanvasError> {
        let edge = self.edge_mut(edge_id)?;
        edge.condition = condition.filter(|c| !c.is_vacuous());
        self.schedule_emit();
        Ok(())
    }

    pub fn set_edge_label(
        &mut self,
        edge_id: &str,
        label: Option<String>,
    ) -> Result<(), CanvasError> {
        let edge = self.edge_mut(edge_id)?;
        edge.label = label.map(|text| text.trim().to_string()).filter(|text| !text.is_empty());
        self.schedule_emit();
        Ok(())
    }

    // ---- selection ----

    pub fn select_node(&mut self, node_id: &str) -> Result<(), CanvasError> {
        if self.node(node_id).is_none() {
            return Err(CanvasError::NodeNotFound(node_id.to_string()));
        }
        self.selection = Selection::Node(node_id.to_string());
        Ok(())
    }

    pub fn select_edge(&mut self, edge_id: &str) -> Result<(), CanvasError> {
        if self.edge(edge_id).is_none() {
            return Err(CanvasError::EdgeNotFound(edge_id.to_string()));
        }
        self.selection = Selection::Edge(edge_id.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    /// Removes the selected element.
    ///
    /// Start and end nodes are protected. Removing a node also removes its
    /// edges; when a removal takes away a condition node's default branch,
    /// the first remaining sibling is promoted.
    pub fn remove_selection(&mut self) -> Result<(), CanvasError> {
        match self.selection.clone() {
            Selection::None => Ok(()),
            Selection::Node(node_id) => {
                let node = self
                    .node(&node_id)
                    .ok_or_else(|| CanvasError::NodeNotFound(node_id.clone()))?;
                if node.data.node_type.is_boundary() {
                    return Err(CanvasError::BoundaryNodeProtected);
                }
                let touched_sources: Vec<String> = self
                    .edges
                    .iter()
                    .filter(|edge| edge.target == node_id)
                    .map(|edge| edge.source.clone())
                    .collect();
                self.nodes.retain(|node| node.id() != node_id);
                self.edges
                    .retain(|edge| edge.source != node_id && edge.target != node_id);
                for source in touched_sources {
                    self.promote_default_branch(&source);
                }
                self.selection = Selection::None;
                self.schedule_emit();
                Ok(())
            }
            Selection::Edge(edge_id) => {
                let source = self
                    .edge(&edge_id)
                    .map(|edge| edge.source.clone())
                    .ok_or_else(|| CanvasError::EdgeNotFound(edge_id.clone()))?;
                self.edges.retain(|edge| edge.id != edge_id);
                self.promote_default_branch(&source);
                self.selection = Selection::None;
                self.schedule_emit();
                Ok(())
            }
        }
    }

    // ---- drag ----

    pub fn begin_drag(&mut self, node_id: &str) -> Result<(), CanvasError> {
        if self.node(node_id).is_none() {
            return Err(CanvasError::NodeNotFound(node_id.to_string()));
        }
        // A drag supersedes any pending emission until it ends.
        self.state = EngineState::Dragging {
            node_id: node_id.to_string(),
        };
        Ok(())
    }

    pub fn drag_to(&mut self, position: Position) {
        if let EngineState::Dragging { node_id } = &self.state {
            let node_id = node_id.clone();
            if let Some(node) = self.nodes.iter_mut().find(|node| node.id() == node_id) {
                node.position = position;
            }
        }
    }

    /// Ends the drag and schedules an immediate emission.
    pub fn end_drag(&mut self) {
        if matches!(self.state, EngineState::Dragging { .. }) {
            self.state = EngineState::PendingEmit {
                due_at_ms: self.clock.now_ms(),
            };
        }
    }

    // ---- emission and resync ----

    /// Produces the pending emission once its debounce window has elapsed.
    ///
    /// The emitted definition is boundary-repaired. An emission whose
    /// signature equals the previous one is swallowed; emitted signatures
    /// are remembered (bounded) for echo detection in
    /// [`Self::apply_external_definition`].
    pub fn poll_emission(&mut self) -> Option<GraphDefinition> {
        let EngineState::PendingEmit { due_at_ms } = self.state else {
            return None;
        };
        if self.clock.now_ms() < due_at_ms {
            return None;
        }
        self.state = EngineState::Idle;
        let definition = ensure_boundary_nodes(&self.build_definition());
        let signature = emission_signature(&definition);
        if signature == self.last_emitted_signature {
            return None;
        }
        self.last_emitted_signature = signature.clone();
        self.remember_signature(signature);
        Some(definition)
    }

    /// Applies a definition arriving from outside the canvas.
    ///
    /// Returns `false` when the definition is an echo of one of the engine's
    /// own recent emissions or already matches the canvas, in which case
    /// nothing changes. Otherwise the canvas is rebuilt from the repaired
    /// definition, the selection is cleared and any pending emission is
    /// cancelled.
    pub fn apply_external_definition(&mut self, definition: &GraphDefinition) -> bool {
        let repaired = ensure_boundary_nodes(definition);
        let signature = emission_signature(&repaired);
        if self.emitted_signatures.contains(&signature) {
            return false;
        }
        let current = emission_signature(&ensure_boundary_nodes(&self.build_definition()));
        if signature == current {
            return false;
        }
        self.state = EngineState::Resyncing;
        self.load(&repaired);
        self.selection = Selection::None;
        self.last_emitted_signature = signature.clone();
        self.remember_signature(signature);
        self.state = EngineState::Idle;
        true
    }

    /// Serializes the canvas back into a definition.
    pub fn build_definition(&self) -> GraphDefinition {
        let mut nodes: Vec<GraphNode> = Vec::with_capacity(self.nodes.len());
        for canvas_node in &self.nodes {
            let mut data = canvas_node.data.clone();
            data.position = Some(canvas_node.position);
            ensure_node_groups(&mut data);
            nodes.push(data);
        }
        let edges: Vec<GraphEdge> = self
            .edges
            .iter()
            .enumerate()
            .map(|(index, edge)| {
                let mut edge = edge.clone();
                if edge.priority <= 0 {
                    edge.priority = index as i64 + 1;
                }
                edge
            })
            .collect();
        let start_node_id = nodes
            .iter()
            .find(|node| node.node_type == NodeType::Start)
            .map(|node| node.id.clone());
        GraphDefinition {
            start_node_id,
            nodes,
            edges,
            ..GraphDefinition::default()
        }
    }

    // ---- layout and repair ----

    /// Recomputes all node positions from the flow structure.
    pub fn auto_layout(&mut self) {
        let definition = self.build_definition();
        let positions = layout_nodes_by_flow(&definition);
        for node in &mut self.nodes {
            if let Some(position) = positions.get(node.data.id.as_str()) {
                node.position = *position;
            }
        }
        self.schedule_emit();
    }

    /// Re-runs boundary repair on the live canvas.
    pub fn repair_boundaries(&mut self) {
        let repaired = ensure_boundary_nodes(&self.build_definition());
        let selection = self.selection.clone();
        self.load(&repaired);
        self.selection = match selection {
            Selection::Node(id) if self.node(&id).is_some() => Selection::Node(id),
            Selection::Edge(id) if self.edge(&id).is_some() => Selection::Edge(id),
            _ => Selection::None,
        };
        self.schedule_emit();
    }

    /// Drops a ready-made condition branch onto the canvas.
    ///
    /// The anchor is the selected node (unless it is an end node), falling
    /// back to the start node. A condition node is wired after the anchor
    /// with two approval branches, the second one the default; both branches
    /// are wired on to the end node when possible.
    pub fn add_condition_branch_template(&mut self) -> Result<String, CanvasError> {
        let anchor_id = self
            .selection
            .node_id()
            .and_then(|id| self.node(id))
            .filter(|node| node.data.node_type != NodeType::End)
            .map(|node| node.id().to_string())
            .or_else(|| {
                self.find_node_of_type(NodeType::Start)
                    .map(|node| node.id().to_string())
            })
            .ok_or_else(|| CanvasError::NodeNotFound("start".to_string()))?;
        let anchor = self
            .node(&anchor_id)
            .ok_or_else(|| CanvasError::NodeNotFound(anchor_id.clone()))?;
        let anchor_position = anchor.position;

        let anchor_type = anchor.data.node_type;
        let condition_id = self.allocate_runtime_id(NodeType::Condition.as_str());
        let condition_node = GraphNode::new(condition_id.clone(), NodeType::Condition);
        self.nodes.push(CanvasNode {
            data: condition_node,
            position: Position::new(anchor_position.x + APPEND_X_GAP, anchor_position.y),
        });
        let anchor_out: Vec<usize> = self
            .edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.source == anchor_id)
            .map(|(index, _)| index)
            .collect();
        if !anchor_type.allows_branching() && anchor_out.len() == 1 {
            // The fork takes over the anchor's existing continuation.
            self.edges[anchor_out[0]].target = condition_id.clone();
        } else if let Err(error) = self.connect(&anchor_id, &condition_id) {
            self.nodes.retain(|node| node.id() != condition_id);
            return Err(error);
        }

        let condition_x = anchor_position.x + APPEND_X_GAP;
        let yes_id = self.spawn_branch_node(
            condition_x + CONDITION_BRANCH_X_GAP,
            anchor_position.y - CONDITION_BRANCH_Y_GAP,
            "Condition met",
        );
        let no_id = self.spawn_branch_node(
            condition_x + CONDITION_BRANCH_X_GAP,
            anchor_position.y + CONDITION_BRANCH_Y_GAP,
            "Default branch",
        );
        let yes_edge = self.push_edge(&condition_id, &yes_id, false);
        let no_edge = self.push_edge(&condition_id, &no_id, true);
        if let Some(edge) = self.edges.iter_mut().find(|edge| edge.id == yes_edge) {
            edge.label = Some("Condition met".to_string());
        }
        if let Some(edge) = self.edges.iter_mut().find(|edge| edge.id == no_edge) {
            edge.label = Some("Default branch".to_string());
        }

        if let Some(end_id) = self
            .find_node_of_type(NodeType::End)
            .map(|node| node.id().to_string())
        {
            // Best effort: branch targets flow on to the end when the rules
            // allow it.
            let _ = self.connect(&yes_id, &end_id);
            let _ = self.connect(&no_id, &end_id);
        }

        self.selection = Selection::Node(condition_id.clone());
        self.schedule_emit();
        Ok(condition_id)
    }

    // ---- internals ----

    fn spawn_branch_node(&mut self, x: f64, y: f64, name: &str) -> String {
        let id = self.allocate_runtime_id(NodeType::Approval.as_str());
        let mut data = GraphNode::new(id.clone(), NodeType::Approval);
        data.name = name.to_string();
        ensure_node_groups(&mut data);
        self.nodes.push(CanvasNode {
            data,
            position: Position::new(x, y),
        });
        id
    }

    fn promote_default_branch(&mut self, source_id: &str) {
        let is_condition = self
            .node(source_id)
            .is_some_and(|node| node.data.node_type == NodeType::Condition);
        if !is_condition {
            return;
        }
        let mut siblings: Vec<&mut GraphEdge> = self
            .edges
            .iter_mut()
            .filter(|edge| edge.source == source_id)
            .collect();
        if siblings.is_empty() || siblings.iter().any(|edge| edge.is_default) {
            return;
        }
        siblings.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        if let Some(first) = siblings.first_mut() {
            first.is_default = true;
        }
    }

    fn push_edge(&mut self, source: &str, target: &str, is_default: bool) -> String {
        let id = self.allocate_edge_id(source, target);
        let priority = self.edges.len() as i64 + 1;
        let mut edge = GraphEdge::new(id.clone(), source.to_string(), target.to_string(), priority);
        edge.is_default = is_default;
        self.edges.push(edge);
        id
    }

    fn allocate_edge_id(&self, source: &str, target: &str) -> String {
        let base = format!("e_{source}_{target}");
        if !self.edges.iter().any(|edge| edge.id == base) {
            return base;
        }
        let mut suffix = 2usize;
        loop {
            let candidate = format!("{base}_{suffix}");
            if !self.edges.iter().any(|edge| edge.id == candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Sequential `{prefix}_{n}` ids, skipping anything already on the
    /// canvas.
    fn allocate_runtime_id(&mut self, prefix: &str) -> String {
        loop {
            let candidate = format!("{prefix}_{}", self.runtime_seq);
            self.runtime_seq += 1;
            let taken = self.nodes.iter().any(|node| node.id() == candidate)
                || self.edges.iter().any(|edge| edge.id == candidate);
            if !taken {
                return candidate;
            }
        }
    }

    fn schedule_emit(&mut self) {
        match self.state {
            EngineState::Dragging { .. } | EngineState::Resyncing => {}
            EngineState::Idle | EngineState::PendingEmit { .. } => {
                self.state = EngineState::PendingEmit {
                    due_at_ms: self.clock.now_ms() + DEBOUNCE_MS,
                };
            }
        }
    }

    fn remember_signature(&mut self, signature: String) {
        if self.emitted_signatures.len() == EMITTED_RING_CAP {
            self.emitted_signatures.pop_front();
        }
        self.emitted_signatures.push_back(signature);
    }

    fn load(&mut self, definition: &GraphDefinition) {
        self.nodes = definition
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let mut data = node.clone();
                ensure_node_groups(&mut data);
                let position = data
                    .position
                    .unwrap_or_else(|| crate::definition::fallback_position(index));
                CanvasNode { data, position }
            })
            .collect();
        self.edges = definition.edges.clone();
    }

    fn node(&self, node_id: &str) -> Option<&CanvasNode> {
        self.nodes.iter().find(|node| node.id() == node_id)
    }

    fn node_mut(&mut self, node_id: &str) -> Result<&mut CanvasNode, CanvasError> {
        self.nodes
            .iter_mut()
            .find(|node| node.id() == node_id)
            .ok_or_else(|| CanvasError::NodeNotFound(node_id.to_string()))
    }

    fn edge(&self, edge_id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|edge| edge.id == edge_id)
    }

    fn edge_mut(&mut self, edge_id: &str) -> Result<&mut GraphEdge, CanvasError> {
        self.edges
            .iter_mut()
            .find(|edge| edge.id == edge_id)
            .ok_or_else(|| CanvasError::EdgeNotFound(edge_id.to_string()))
    }

    fn find_node_of_type(&self, node_type: NodeType) -> Option<&CanvasNode> {
        self.nodes
            .iter()
            .find(|node| node.data.node_type == node_type)
    }
}

impl std::fmt::Debug for CanvasEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasEngine")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("selection", &self.selection)
            .field("state", &self.state)
            .finish()
    }
}
