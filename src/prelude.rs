//! Convenience re-exports for downstream users.

pub use crate::canvas::{
    CanvasEngine, CanvasNode, Clock, DEBOUNCE_MS, EngineState, Selection, SystemClock,
};
pub use crate::condition::{
    Condition, ConditionDraft, ConditionForm, ConditionLogic, ConditionRule, RuleOperator,
    check_expression, condition_to_draft, draft_to_condition, preview_expression,
};
pub use crate::definition::{
    ApprovalMode, ApprovalType, ApproverGroup, ApproverType, FieldPermission, GRAPH_VERSION,
    GraphDefinition, GraphEdge, GraphNode, NodeType, Position, WorkflowStep, connection_error,
    default_definition, ensure_boundary_nodes, extract_steps, has_path, history_signature,
    steps_to_definition,
};
pub use crate::error::{CanvasError, ConnectError, ExpressionError};
pub use crate::history::{HISTORY_CAP, History, REPLAY_LOCK_MS};
pub use crate::layout::layout_nodes_by_flow;
pub use crate::validate::{IssueCode, ValidationIssue, ValidationReport, validate_definition};
