mod common;

use serde_json::json;

use common::{amount_condition, edge, node};
use shinsa::definition::{GraphDefinition, NodeType, default_definition};
use shinsa::validate::{IssueCode, validate_definition, validate_value};

fn codes(issues: &[shinsa::validate::ValidationIssue]) -> Vec<IssueCode> {
    issues.iter().map(|issue| issue.code).collect()
}

#[test]
fn the_default_definition_is_valid() {
    let report = validate_definition(&default_definition());
    assert!(report.valid);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn empty_definitions_short_circuit() {
    let report = validate_definition(&GraphDefinition::default());
    assert!(!report.valid);
    assert_eq!(codes(&report.errors), vec![IssueCode::InvalidDefinitionNodes]);
}

#[test]
fn non_object_payloads_are_invalid_definitions() {
    let report = validate_value(&json!([1, 2, 3]));
    assert_eq!(codes(&report.errors), vec![IssueCode::InvalidDefinition]);
}

#[test]
fn boundary_arity_is_enforced() {
    let mut definition = default_definition();
    definition.nodes.push(node("start_2", NodeType::Start));
    definition.nodes.retain(|n| n.node_type != NodeType::End);
    definition.edges.retain(|e| e.target != "end");
    let report = validate_definition(&definition);
    assert!(codes(&report.errors).contains(&IssueCode::InvalidStartNode));
    assert!(codes(&report.errors).contains(&IssueCode::MissingEndNode));
}

#[test]
fn boundary_edge_directions_are_enforced() {
    let mut definition = default_definition();
    definition.edges.push(edge("bad_in", "approval_1", "start", 3));
    definition.edges.push(edge("bad_out", "end", "approval_1", 4));
    let report = validate_definition(&definition);
    let found = codes(&report.errors);
    assert!(found.contains(&IssueCode::StartNodeHasIncomingEdge));
    assert!(found.contains(&IssueCode::EndNodeHasOutgoingEdge));

    let incoming = report
        .errors
        .iter()
        .find(|issue| issue.code == IssueCode::StartNodeHasIncomingEdge)
        .unwrap();
    assert_eq!(incoming.edge_ids, vec!["bad_in"]);
}

#[test]
fn condition_branch_shape_is_enforced() {
    let mut definition = default_definition();
    definition.nodes.push(node("cond", NodeType::Condition));
    definition.nodes.push(node("b", NodeType::Approval));
    definition.edges.retain(|e| e.id != "e_approval_1_end");
    definition.edges.push(edge("e1", "approval_1", "cond", 2));

    // Single branch, and that branch carries a condition (no default).
    let mut only = edge("e2", "cond", "b", 3);
    only.condition = Some(amount_condition());
    definition.edges.push(only);
    definition.edges.push(edge("e3", "b", "end", 4));

    let report = validate_definition(&definition);
    let found = codes(&report.errors);
    assert!(found.contains(&IssueCode::ConditionNodeRequiresBranches));
    assert!(found.contains(&IssueCode::ConditionNodeMissingDefaultBranch));
}

#[test]
fn multiple_default_branches_are_rejected() {
    let mut definition = default_definition();
    definition.nodes.push(node("cond", NodeType::Condition));
    definition.nodes.push(node("b", NodeType::Approval));
    definition.nodes.push(node("c", NodeType::Approval));
    definition.edges.retain(|e| e.id != "e_approval_1_end");
    definition.edges.push(edge("e1", "approval_1", "cond", 2));
    let mut to_b = edge("e2", "cond", "b", 3);
    to_b.is_default = true;
    let mut to_c = edge("e3", "cond", "c", 4);
    to_c.is_default = true;
    definition.edges.push(to_b);
    definition.edges.push(to_c);
    definition.edges.push(edge("e4", "b", "end", 5));
    definition.edges.push(edge("e5", "c", "end", 6));

    let report = validate_definition(&definition);
    assert!(codes(&report.errors).contains(&IssueCode::ConditionNodeMultipleDefaultBranch));
}

#[test]
fn parallel_arity_is_enforced() {
    let mut definition = default_definition();
    definition.nodes.push(node("split", NodeType::ParallelStart));
    definition.nodes.push(node("join", NodeType::ParallelJoin));
    definition.edges.retain(|e| e.id != "e_approval_1_end");
    definition.edges.push(edge("e1", "approval_1", "split", 2));
    definition.edges.push(edge("e2", "split", "join", 3));
    definition.edges.push(edge("e3", "join", "end", 4));

    let report = validate_definition(&definition);
    let found = codes(&report.errors);
    assert!(found.contains(&IssueCode::ParallelStartRequiresBranches));
    assert!(found.contains(&IssueCode::ParallelJoinRequiresIncoming));
}

#[test]
fn subprocess_nodes_need_a_template() {
    let mut definition = default_definition();
    definition.nodes.push(node("sub", NodeType::Subprocess));
    definition.edges.retain(|e| e.id != "e_approval_1_end");
    definition.edges.push(edge("e1", "approval_1", "sub", 2));
    definition.edges.push(edge("e2", "sub", "end", 3));

    let report = validate_definition(&definition);
    assert!(codes(&report.errors).contains(&IssueCode::InvalidSubprocessTemplate));

    definition
        .nodes
        .iter_mut()
        .find(|n| n.id == "sub")
        .unwrap()
        .subprocess_template_id = Some(42);
    assert!(validate_definition(&definition).valid);
}

#[test]
fn unreachable_and_dead_end_nodes_are_reported() {
    let mut definition = default_definition();
    definition.nodes.push(node("island", NodeType::Approval));
    definition.nodes.push(node("trap", NodeType::Approval));
    definition.nodes.push(node("trap_sink", NodeType::Cc));
    definition.edges.push(edge("e1", "approval_1", "trap", 3));
    definition.edges.push(edge("e2", "trap", "trap_sink", 4));

    let report = validate_definition(&definition);
    let unreachable = report
        .errors
        .iter()
        .find(|issue| issue.code == IssueCode::UnreachableNodes)
        .unwrap();
    assert_eq!(unreachable.nodes, vec!["island"]);

    let dead = report
        .errors
        .iter()
        .find(|issue| issue.code == IssueCode::DeadEndNodes)
        .unwrap();
    assert_eq!(dead.nodes, vec!["trap", "trap_sink"]);
}

#[test]
fn cycles_are_reported() {
    let mut definition = default_definition();
    definition.nodes.push(node("b", NodeType::Approval));
    definition.edges.push(edge("e1", "approval_1", "b", 3));
    definition.edges.push(edge("e2", "b", "approval_1", 4));

    let report = validate_definition(&definition);
    assert!(codes(&report.errors).contains(&IssueCode::GraphHasCycle));
}

#[test]
fn soft_problems_surface_as_warnings() {
    let mut definition = default_definition();
    definition.nodes.push(node("b", NodeType::Approval));
    // approval_1 branches without being a condition node.
    definition.edges.push(edge("e1", "approval_1", "b", 3));
    definition.edges.push(edge("e2", "b", "end", 4));
    // A default branch carrying a condition.
    definition
        .edges
        .iter_mut()
        .find(|e| e.id == "e_approval_1_end")
        .unwrap()
        .is_default = true;
    definition
        .edges
        .iter_mut()
        .find(|e| e.id == "e_approval_1_end")
        .unwrap()
        .condition = Some(amount_condition());

    let report = validate_definition(&definition);
    assert!(report.valid);
    let found = codes(&report.warnings);
    assert!(found.contains(&IssueCode::NonConditionMultiBranch));
    assert!(found.contains(&IssueCode::DefaultBranchWithCondition));
}

#[test]
fn the_report_serializes_with_stable_codes() {
    let mut definition = default_definition();
    definition.nodes.push(node("island", NodeType::Approval));
    let report = validate_definition(&definition);
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["valid"], false);
    let serialized_codes: Vec<&str> = value["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|issue| issue["code"].as_str())
        .collect();
    assert!(serialized_codes.contains(&"node_missing_outgoing_edge"));
    assert!(serialized_codes.contains(&"unreachable_nodes"));
}
