//! Wire types of the `graph_v1` process definition.
//!
//! The definition JSON is both the persisted template format and the payload
//! exchanged between the designer canvas and its host, so field names and
//! skip rules here are load-bearing: a definition serialized by this module
//! must be byte-stable for the history and emission signatures to work.

use serde::{Deserialize, Serialize};

use crate::condition::Condition;

/// Wire version tag of the graph definition format.
pub const GRAPH_VERSION: &str = "graph_v1";

/// Canvas position of a node, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Kind of a process node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Start,
    #[default]
    Approval,
    Cc,
    Condition,
    ParallelStart,
    ParallelJoin,
    Subprocess,
    End,
}

impl NodeType {
    pub const ALL: [NodeType; 8] = [
        NodeType::Start,
        NodeType::Approval,
        NodeType::Cc,
        NodeType::Condition,
        NodeType::ParallelStart,
        NodeType::ParallelJoin,
        NodeType::Subprocess,
        NodeType::End,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Start => "start",
            NodeType::Approval => "approval",
            NodeType::Cc => "cc",
            NodeType::Condition => "condition",
            NodeType::ParallelStart => "parallel_start",
            NodeType::ParallelJoin => "parallel_join",
            NodeType::Subprocess => "subprocess",
            NodeType::End => "end",
        }
    }

    /// Display name shown on the canvas palette.
    pub fn label(self) -> &'static str {
        match self {
            NodeType::Start => "Start",
            NodeType::Approval => "Approval",
            NodeType::Cc => "CC",
            NodeType::Condition => "Condition",
            NodeType::ParallelStart => "Parallel split",
            NodeType::ParallelJoin => "Parallel join",
            NodeType::Subprocess => "Subprocess",
            NodeType::End => "End",
        }
    }

    /// Lenient parse used during hydration; unknown types become `approval`.
    pub fn from_raw(raw: &str) -> Self {
        let text = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == text)
            .unwrap_or(NodeType::Approval)
    }

    /// True for the two boundary kinds the repair pass guarantees.
    pub fn is_boundary(self) -> bool {
        matches!(self, NodeType::Start | NodeType::End)
    }

    /// True when the node may fan out to more than one outgoing edge.
    pub fn allows_branching(self) -> bool {
        matches!(self, NodeType::Condition | NodeType::ParallelStart)
    }
}

/// How a multi-group approval step resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalType {
    #[default]
    Any,
    All,
    Sequential,
}

impl ApprovalType {
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => ApprovalType::All,
            "sequential" => ApprovalType::Sequential,
            _ => ApprovalType::Any,
        }
    }

    /// The runtime mode mirrored onto the wire; `sequential` executes as
    /// all-of in order.
    pub fn mode(self) -> ApprovalMode {
        match self {
            ApprovalType::Any => ApprovalMode::Any,
            ApprovalType::All | ApprovalType::Sequential => ApprovalMode::All,
        }
    }
}

/// Runtime resolution mode derived from [`ApprovalType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    #[default]
    Any,
    All,
}

/// How the members of an approver group are resolved at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproverType {
    User,
    Role,
    #[default]
    Manager,
    DepartmentManager,
    Position,
    ApplicantSelect,
    PreviousHandler,
}

impl ApproverType {
    pub const ALL: [ApproverType; 7] = [
        ApproverType::User,
        ApproverType::Role,
        ApproverType::Manager,
        ApproverType::DepartmentManager,
        ApproverType::Position,
        ApproverType::ApplicantSelect,
        ApproverType::PreviousHandler,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApproverType::User => "user",
            ApproverType::Role => "role",
            ApproverType::Manager => "manager",
            ApproverType::DepartmentManager => "department_manager",
            ApproverType::Position => "position",
            ApproverType::ApplicantSelect => "applicant_select",
            ApproverType::PreviousHandler => "previous_handler",
        }
    }

    pub fn from_raw(raw: &str) -> Self {
        let text = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == text)
            .unwrap_or(ApproverType::Manager)
    }
}

/// One resolved set of approvers on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproverGroup {
    pub id: String,
    #[serde(default)]
    pub name: String,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_step_offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc_user_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

/// Per-field visibility and edit rights for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPermission {
    pub field_key: String,
    #[serde(default)]
    pub can_view: bool,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub required: bool,
}

impl FieldPermission {
    /// Enforces the permission ladder: required implies editable, editable
    /// implies visible.
    pub fn normalized(mut self) -> Self {
        if self.required {
            self.can_edit = true;
        }
        if self.can_edit {
            self.can_view = true;
        }
        self
    }
}

/// One node of the process graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub node_type: NodeType,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_type: Option<ApprovalType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_mode: Option<ApprovalMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approver_groups: Vec<ApproverGroup>,
    // Flat mirror of the primary group, kept for pre-group consumers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_type: Option<ApproverType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approver_user_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approver_roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approver_positions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_field_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_step_offset: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc_user_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_permissions: Vec<FieldPermission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subprocess_template_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_self_approve: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_return: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_hours: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl GraphNode {
    /// A bare node of the given kind with its palette label as name.
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            name: node_type.label().to_string(),
            approval_type: None,
            approval_mode: None,
            approver_groups: Vec::new(),
            approver_type: None,
            approver_user_ids: Vec::new(),
            approver_roles: Vec::new(),
            approver_positions: Vec::new(),
            approver_field_key: None,
            previous_step_offset: None,
            cc_user_ids: Vec::new(),
            field_permissions: Vec::new(),
            subprocess_template_id: None,
            allow_self_approve: None,
            allow_return: None,
            timeout_hours: None,
            condition: None,
            position: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }
}

/// One directed edge of the process graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GraphEdge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        priority: i64,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            priority,
            condition: None,
            is_default: false,
            label: None,
        }
    }

    /// The label shown on the canvas for this edge.
    ///
    /// An explicit label wins. Otherwise a default branch reads
    /// "Default branch", a conditionless edge stays blank, an expression
    /// condition reads "Expression rule" and a rule condition shows its first
    /// rule.
    pub fn display_label(&self) -> String {
        if let Some(label) = self.label.as_deref() {
            if !label.trim().is_empty() {
                return label.to_string();
            }
        }
        let Some(condition) = &self.condition else {
            return if self.is_default {
                "Default branch".to_string()
            } else {
                String::new()
            };
        };
        if condition
            .expression
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
        {
            return "Expression rule".to_string();
        }
        match condition.rules.first() {
            Some(rule) => format!("{} {}", rule.field, rule.operator),
            None => String::new(),
        }
    }
}

/// The full `graph_v1` process definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDefinition {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_node_id: Option<String>,
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

fn default_version() -> String {
    GRAPH_VERSION.to_string()
}

impl Default for GraphDefinition {
    fn default() -> Self {
        Self {
            version: default_version(),
            start_node_id: None,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

impl GraphDefinition {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    pub fn start_node(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.node_type == NodeType::Start)
    }

    pub fn end_nodes(&self) -> Vec<&GraphNode> {
        self.nodes
            .iter()
            .filter(|node| node.node_type == NodeType::End)
            .collect()
    }

    /// Outgoing edges of a node, ordered by `(priority, id)`.
    pub fn outgoing_edges(&self, node_id: &str) -> Vec<&GraphEdge> {
        let mut edges: Vec<&GraphEdge> = self
            .edges
            .iter()
            .filter(|edge| edge.source == node_id)
            .collect();
        edges.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        edges
    }

    pub fn incoming_edges(&self, node_id: &str) -> Vec<&GraphEdge> {
        self.edges.iter().filter(|edge| edge.target == node_id).collect()
    }
}

/// The three-node definition a new template starts from.
pub fn default_definition() -> GraphDefinition {
    let start = GraphNode::new("start", NodeType::Start).at(80.0, 180.0);
    let approval = GraphNode::new("approval_1", NodeType::Approval).at(340.0, 180.0);
    let end = GraphNode::new("end", NodeType::End).at(620.0, 180.0);
    GraphDefinition {
        version: default_version(),
        start_node_id: Some("start".to_string()),
        nodes: vec![start, approval, end],
        edges: vec![
            GraphEdge::new("e_start_approval_1", "start", "approval_1", 1),
            GraphEdge::new("e_approval_1_end", "approval_1", "end", 2),
        ],
    }
}
