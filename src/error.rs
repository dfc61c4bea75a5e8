use thiserror::Error;

/// Reasons a requested connection between two canvas nodes is rejected.
///
/// Checks run in a fixed order; the first failing rule wins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("A node cannot connect to itself")]
    SelfLoop,

    #[error("An end node cannot have outgoing connections")]
    SourceIsEnd,

    #[error("A start node cannot have incoming connections")]
    TargetIsStart,

    // Field names avoid `source`, which thiserror would treat as the
    // error's cause.
    #[error("A connection from '{source_id}' to '{target_id}' already exists")]
    DuplicateEdge { source_id: String, target_id: String },

    #[error("This connection would create a cycle; loops are not supported")]
    WouldCreateCycle,

    #[error("This node supports a single outgoing connection; add a condition node to branch")]
    SingleOutgoingExceeded,

    #[error("A condition node supports at most two outgoing connections")]
    ConditionBranchLimit,
}

/// Errors raised by canvas edit operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    #[error("Node '{0}' not found on the canvas")]
    NodeNotFound(String),

    #[error("Edge '{0}' not found on the canvas")]
    EdgeNotFound(String),

    #[error("Approver group '{group_id}' not found on node '{node_id}'")]
    GroupNotFound { node_id: String, group_id: String },

    #[error("A process can only have one start node")]
    StartNodeExists,

    #[error("A start node cannot be appended after another node")]
    AppendTargetIsStart,

    #[error("Nodes cannot be appended after an end node")]
    AppendAfterEnd,

    #[error("Start and end nodes cannot be removed")]
    BoundaryNodeProtected,

    #[error("A node must keep at least one approver group")]
    LastApproverGroup,

    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// Errors produced by the local condition-expression guard.
///
/// The server remains the authority on expression validity; this guard only
/// rejects input that could never be embedded as a boolean sub-expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("Expression is empty")]
    Empty,

    #[error("Unbalanced '{bracket}' at byte {position}")]
    UnbalancedBracket { bracket: char, position: usize },

    #[error("Unterminated string literal")]
    UnterminatedString,

    #[error("Expression contains a forbidden token: '{0}'")]
    ForbiddenToken(String),

    #[error("Call to '{0}' is not allowed in condition expressions")]
    ForbiddenCall(String),
}
