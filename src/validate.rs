//! Full-definition validation.
//!
//! Produces the report the save and publish paths consume: a list of hard
//! errors and a list of warnings, each carrying a stable issue code plus the
//! node and edge ids involved. The checks here are authoritative; the
//! per-connection checks in [`crate::definition::connection_error`] exist
//! only to reject bad edits early.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::{GraphDefinition, GraphEdge, NodeType};

/// Stable identifier of one validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidDefinition,
    InvalidDefinitionNodes,
    InvalidStartNode,
    MissingEndNode,
    StartNodeHasIncomingEdge,
    EndNodeHasOutgoingEdge,
    NodeMissingOutgoingEdge,
    ConditionNodeRequiresBranches,
    ConditionNodeMissingDefaultBranch,
    ConditionNodeMultipleDefaultBranch,
    ParallelStartRequiresBranches,
    ParallelJoinRequiresIncoming,
    InvalidSubprocessTemplate,
    NonConditionMultiBranch,
    DefaultBranchWithCondition,
    UnreachableNodes,
    DeadEndNodes,
    GraphHasCycle,
}

/// One finding, with the elements it concerns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edge_ids: Vec<String>,
}

impl ValidationIssue {
    fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            nodes: Vec::new(),
            edge_ids: Vec::new(),
        }
    }

    fn with_nodes(mut self, mut nodes: Vec<String>) -> Self {
        nodes.sort();
        nodes.dedup();
        self.nodes = nodes;
        self
    }

    fn with_edges(mut self, mut edge_ids: Vec<String>) -> Self {
        edge_ids.sort();
        edge_ids.dedup();
        self.edge_ids = edge_ids;
        self
    }
}

/// The validation outcome: `valid` iff no errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<ValidationIssue>,
    #[serde(default)]
    pub warnings: Vec<ValidationIssue>,
}

/// Validates raw JSON, hydrating it leniently first.
pub fn validate_value(raw: &Value) -> ValidationReport {
    if !raw.is_object() {
        let issue = ValidationIssue::new(
            IssueCode::InvalidDefinition,
            "The process definition must be a JSON object",
        );
        return ValidationReport {
            valid: false,
            errors: vec![issue],
            warnings: Vec::new(),
        };
    }
    validate_definition(&GraphDefinition::from_value(raw))
}

/// Validates a hydrated definition.
pub fn validate_definition(definition: &GraphDefinition) -> ValidationReport {
    let mut errors: Vec<ValidationIssue> = Vec::new();
    let mut warnings: Vec<ValidationIssue> = Vec::new();

    if definition.nodes.is_empty() {
        errors.push(ValidationIssue::new(
            IssueCode::InvalidDefinitionNodes,
            "The process definition contains no nodes",
        ));
        return ValidationReport {
            valid: false,
            errors,
            warnings,
        };
    }

    let start_nodes: Vec<&str> = definition
        .nodes
        .iter()
        .filter(|node| node.node_type == NodeType::Start)
        .map(|node| node.id.as_str())
        .collect();
    if start_nodes.len() != 1 {
        errors.push(
            ValidationIssue::new(
                IssueCode::InvalidStartNode,
                "The process must contain exactly one start node",
            )
            .with_nodes(start_nodes.iter().map(|id| id.to_string()).collect()),
        );
    }
    let end_ids: AHashSet<&str> = definition
        .nodes
        .iter()
        .filter(|node| node.node_type == NodeType::End)
        .map(|node| node.id.as_str())
        .collect();
    if end_ids.is_empty() {
        errors.push(ValidationIssue::new(
            IssueCode::MissingEndNode,
            "The process must contain an end node",
        ));
    }

    let mut outgoing: AHashMap<&str, Vec<&GraphEdge>> = AHashMap::new();
    let mut incoming: AHashMap<&str, Vec<&GraphEdge>> = AHashMap::new();
    for edge in &definition.edges {
        outgoing.entry(edge.source.as_str()).or_default().push(edge);
        incoming.entry(edge.target.as_str()).or_default().push(edge);
    }
    for edges in outgoing.values_mut() {
        edges.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
    }

    for node in &definition.nodes {
        let id = node.id.as_str();
        let out = outgoing.get(id).map(Vec::as_slice).unwrap_or_default();
        let inc = incoming.get(id).map(Vec::as_slice).unwrap_or_default();
        match node.node_type {
            NodeType::Start => {
                if !inc.is_empty() {
                    errors.push(
                        ValidationIssue::new(
                            IssueCode::StartNodeHasIncomingEdge,
                            "The start node cannot have incoming connections",
                        )
                        .with_nodes(vec![id.to_string()])
                        .with_edges(inc.iter().map(|edge| edge.id.clone()).collect()),
                    );
                }
            }
            NodeType::End => {
                if !out.is_empty() {
                    errors.push(
                        ValidationIssue::new(
                            IssueCode::EndNodeHasOutgoingEdge,
                            "An end node cannot have outgoing connections",
                        )
                        .with_nodes(vec![id.to_string()])
                        .with_edges(out.iter().map(|edge| edge.id.clone()).collect()),
                    );
                }
            }
            NodeType::Condition => {
                if out.len() < 2 {
                    errors.push(
                        ValidationIssue::new(
                            IssueCode::ConditionNodeRequiresBranches,
                            format!("Condition node '{}' needs at least two branches", node.name),
                        )
                        .with_nodes(vec![id.to_string()]),
                    );
                }
                let defaults: Vec<&&GraphEdge> =
                    out.iter().filter(|edge| is_default_branch(edge)).collect();
                if !out.is_empty() && defaults.is_empty() {
                    errors.push(
                        ValidationIssue::new(
                            IssueCode::ConditionNodeMissingDefaultBranch,
                            format!("Condition node '{}' has no default branch", node.name),
                        )
                        .with_nodes(vec![id.to_string()]),
                    );
                }
                if defaults.len() > 1 {
                    errors.push(
                        ValidationIssue::new(
                            IssueCode::ConditionNodeMultipleDefaultBranch,
                            format!(
                                "Condition node '{}' has more than one default branch",
                                node.name
                            ),
                        )
                        .with_nodes(vec![id.to_string()])
                        .with_edges(defaults.iter().map(|edge| edge.id.clone()).collect()),
                    );
                }
            }
            NodeType::ParallelStart => {
                if out.len() < 2 {
                    errors.push(
                        ValidationIssue::new(
                            IssueCode::ParallelStartRequiresBranches,
                            format!(
                                "Parallel split '{}' needs at least two branches",
                                node.name
                            ),
                        )
                        .with_nodes(vec![id.to_string()]),
                    );
                }
            }
            NodeType::ParallelJoin => {
                if inc.len() < 2 {
                    errors.push(
                        ValidationIssue::new(
                            IssueCode::ParallelJoinRequiresIncoming,
                            format!(
                                "Parallel join '{}' needs at least two incoming branches",
                                node.name
                            ),
                        )
                        .with_nodes(vec![id.to_string()]),
                    );
                }
            }
            NodeType::Subprocess => {
                if node.subprocess_template_id.is_none() {
                    errors.push(
                        ValidationIssue::new(
                            IssueCode::InvalidSubprocessTemplate,
                            format!("Subprocess node '{}' has no template assigned", node.name),
                        )
                        .with_nodes(vec![id.to_string()]),
                    );
                }
            }
            NodeType::Approval | NodeType::Cc => {}
        }

        if node.node_type != NodeType::End && out.is_empty() {
            errors.push(
                ValidationIssue::new(
                    IssueCode::NodeMissingOutgoingEdge,
                    format!("Node '{}' has no outgoing connection", node.name),
                )
                .with_nodes(vec![id.to_string()]),
            );
        }
        if !node.node_type.allows_branching() && out.len() > 1 {
            warnings.push(
                ValidationIssue::new(
                    IssueCode::NonConditionMultiBranch,
                    format!(
                        "Node '{}' has multiple outgoing connections; only the first will run",
                        node.name
                    ),
                )
                .with_nodes(vec![id.to_string()])
                .with_edges(out.iter().map(|edge| edge.id.clone()).collect()),
            );
        }
    }

    let conditioned_defaults: Vec<String> = definition
        .edges
        .iter()
        .filter(|edge| edge.is_default && edge.condition.is_some())
        .map(|edge| edge.id.clone())
        .collect();
    if !conditioned_defaults.is_empty() {
        warnings.push(
            ValidationIssue::new(
                IssueCode::DefaultBranchWithCondition,
                "Default branches carry a condition that will never be evaluated",
            )
            .with_edges(conditioned_defaults),
        );
    }

    if let [start_id] = start_nodes.as_slice() {
        let start_id: &str = start_id;
        let reachable = walk(start_id, &outgoing, |edge| edge.target.as_str());
        let unreachable: Vec<String> = definition
            .nodes
            .iter()
            .filter(|node| !reachable.contains(node.id.as_str()))
            .map(|node| node.id.clone())
            .collect();
        if !unreachable.is_empty() {
            errors.push(
                ValidationIssue::new(
                    IssueCode::UnreachableNodes,
                    "Some nodes are not reachable from the start node",
                )
                .with_nodes(unreachable),
            );
        }

        // Backward walk from every end node.
        let mut reaches_end: AHashSet<&str> = AHashSet::new();
        for end_id in end_ids.iter().copied() {
            reaches_end.extend(walk(end_id, &incoming, |edge| edge.source.as_str()));
        }
        let dead_ends: Vec<String> = definition
            .nodes
            .iter()
            .filter(|node| {
                reachable.contains(node.id.as_str()) && !reaches_end.contains(node.id.as_str())
            })
            .map(|node| node.id.clone())
            .collect();
        if !dead_ends.is_empty() {
            errors.push(
                ValidationIssue::new(
                    IssueCode::DeadEndNodes,
                    "Some nodes can never reach an end node",
                )
                .with_nodes(dead_ends),
            );
        }

        if has_cycle(start_id, &outgoing) {
            errors.push(ValidationIssue::new(
                IssueCode::GraphHasCycle,
                "The process graph contains a cycle",
            ));
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// An edge counts as the default branch when flagged or conditionless.
fn is_default_branch(edge: &GraphEdge) -> bool {
    edge.is_default || edge.condition.is_none()
}

fn walk<'a>(
    from: &'a str,
    links: &AHashMap<&'a str, Vec<&'a GraphEdge>>,
    step: impl Fn(&'a GraphEdge) -> &'a str,
) -> AHashSet<&'a str> {
    let mut seen: AHashSet<&str> = AHashSet::new();
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        if let Some(edges) = links.get(current) {
            for edge in edges.iter().copied() {
                stack.push(step(edge));
            }
        }
    }
    seen
}

/// Three-color depth-first search over the part reachable from the start.
fn has_cycle(start: &str, outgoing: &AHashMap<&str, Vec<&GraphEdge>>) -> bool {
    let mut visiting: AHashSet<&str> = AHashSet::new();
    let mut done: AHashSet<&str> = AHashSet::new();
    // (node, child index already explored)
    let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
    visiting.insert(start);
    while let Some((current, cursor)) = stack.pop() {
        let children = outgoing.get(current).map(Vec::as_slice).unwrap_or_default();
        if cursor < children.len() {
            stack.push((current, cursor + 1));
            let child = children[cursor].target.as_str();
            if visiting.contains(child) {
                return true;
            }
            if !done.contains(child) {
                visiting.insert(child);
                stack.push((child, 0));
            }
        } else {
            visiting.remove(current);
            done.insert(current);
        }
    }
    false
}
