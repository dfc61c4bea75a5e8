mod common;

use serde_json::{Value, json};

use common::{edge, node};
use shinsa::definition::{
    GraphDefinition, NodeType, connection_error, default_definition, ensure_boundary_nodes,
    extract_steps, has_path, history_signature, steps_to_definition,
};
use shinsa::error::ConnectError;

#[test]
fn default_definition_serializes_with_wire_field_names() {
    let value = serde_json::to_value(default_definition()).unwrap();
    assert_eq!(value["version"], "graph_v1");
    assert_eq!(value["start_node_id"], "start");
    assert_eq!(value["nodes"][0]["node_type"], "start");
    assert_eq!(value["nodes"][1]["id"], "approval_1");
    assert_eq!(value["edges"][0]["source"], "start");
    assert_eq!(value["edges"][0]["is_default"], false);
    // Absent optionals are skipped, not serialized as null.
    assert!(value["edges"][0].get("condition").is_none());
    assert!(value["edges"][0].get("label").is_none());
    assert!(value["nodes"][0].get("subprocess_template_id").is_none());
}

#[test]
fn hydration_survives_malformed_input() {
    let raw = json!({
        "nodes": [
            {"id": "start", "node_type": "start"},
            {"node_type": "weird_future_type"},
            {"id": "end", "node_type": "end", "position": {"x": "oops"}},
        ],
        "edges": [
            {"id": "ok", "source": "start", "target": "end", "is_default": "yes"},
            {"source": "", "target": "end"},
            {"source": "start"},
            "not an edge",
        ],
    });
    let definition = GraphDefinition::from_value(&raw);

    assert_eq!(definition.nodes.len(), 3);
    // Unknown node types fall back to approval; missing ids are synthesized.
    assert_eq!(definition.nodes[1].node_type, NodeType::Approval);
    assert_eq!(definition.nodes[1].id, "approval_2");
    // A broken position falls back to the grid slot.
    assert!(definition.nodes[2].position.is_some());
    // Edges with blank or missing endpoints are dropped.
    assert_eq!(definition.edges.len(), 1);
    assert!(definition.edges[0].is_default);
    assert_eq!(definition.start_node_id.as_deref(), Some("start"));
}

#[test]
fn hydration_reads_step_options() {
    let raw = json!({
        "nodes": [{
            "id": "a", "node_type": "approval",
            "allow_self_approve": "yes", "allow_return": 0, "timeout_hours": 24,
            "condition": {"rules": [{"field": "amount", "operator": "gt", "value": 5}]},
        }],
        "edges": [],
    });
    let definition = GraphDefinition::from_value(&raw);
    let node = &definition.nodes[0];
    assert_eq!(node.allow_self_approve, Some(true));
    assert_eq!(node.allow_return, Some(false));
    assert_eq!(node.timeout_hours, Some(24));
    assert!(node.condition.is_some());
}

#[test]
fn hydration_drops_malformed_conditions() {
    let raw = json!({
        "nodes": [{"id": "a", "node_type": "start"}, {"id": "b", "node_type": "end"}],
        "edges": [
            {"id": "e1", "source": "a", "target": "b", "condition": {"rules": [{"field": "  "}]}},
        ],
    });
    let definition = GraphDefinition::from_value(&raw);
    assert!(definition.edges[0].condition.is_none());
}

#[test]
fn boundary_repair_creates_and_wires_missing_boundaries() {
    let definition = GraphDefinition {
        nodes: vec![node("review", NodeType::Approval)],
        ..GraphDefinition::default()
    };
    let repaired = ensure_boundary_nodes(&definition);

    let start = repaired.start_node().unwrap();
    assert_eq!(start.id, "start");
    assert_eq!(repaired.end_nodes().len(), 1);
    assert_eq!(repaired.start_node_id.as_deref(), Some("start"));
    // start -> review -> end
    assert!(repaired.edges.iter().any(|e| e.source == "start" && e.target == "review"));
    assert!(repaired.edges.iter().any(|e| e.source == "review" && e.target == "end"));
}

#[test]
fn boundary_repair_is_idempotent() {
    let definition = GraphDefinition {
        nodes: vec![node("review", NodeType::Approval)],
        ..GraphDefinition::default()
    };
    let once = ensure_boundary_nodes(&definition);
    let twice = ensure_boundary_nodes(&once);
    assert_eq!(
        serde_json::to_string(&once).unwrap(),
        serde_json::to_string(&twice).unwrap()
    );
}

#[test]
fn boundary_repair_drops_dangling_and_duplicate_elements() {
    let mut definition = default_definition();
    definition.nodes.push(node("approval_1", NodeType::Approval));
    definition.edges.push(edge("dangling", "approval_1", "ghost", 9));
    definition.edges.push(edge("loop", "approval_1", "approval_1", 10));
    let repaired = ensure_boundary_nodes(&definition);

    assert_eq!(
        repaired.nodes.iter().filter(|n| n.id == "approval_1").count(),
        1
    );
    assert!(repaired.edge("dangling").is_none());
    assert!(repaired.edge("loop").is_none());
}

#[test]
fn connection_rules_fire_in_order() {
    let definition = default_definition();
    let start = definition.node("start").unwrap();
    let approval = definition.node("approval_1").unwrap();
    let end = definition.node("end").unwrap();

    assert_eq!(
        connection_error(start, start, &definition.edges),
        Some(ConnectError::SelfLoop)
    );
    assert_eq!(
        connection_error(end, approval, &definition.edges),
        Some(ConnectError::SourceIsEnd)
    );
    assert_eq!(
        connection_error(approval, start, &definition.edges),
        Some(ConnectError::TargetIsStart)
    );
    assert_eq!(
        connection_error(start, approval, &definition.edges),
        Some(ConnectError::DuplicateEdge {
            source_id: "start".to_string(),
            target_id: "approval_1".to_string(),
        })
    );
    // The rejection message names both endpoints.
    let duplicate = connection_error(start, approval, &definition.edges).unwrap();
    assert_eq!(
        duplicate.to_string(),
        "A connection from 'start' to 'approval_1' already exists"
    );
    // approval_1 -> end exists, so end -> ... is ruled out above and a new
    // start -> end edge would exceed start's single outgoing slot.
    assert_eq!(
        connection_error(start, end, &definition.edges),
        Some(ConnectError::SingleOutgoingExceeded)
    );
}

#[test]
fn cycle_detection_blocks_back_edges() {
    let mut definition = default_definition();
    definition.nodes.push(node("review", NodeType::Approval));
    definition.edges.push(edge("e_end_review", "approval_1", "review", 3));
    let review = definition.node("review").unwrap();
    let approval = definition.node("approval_1").unwrap();

    assert!(has_path(&definition.edges, "start", "review"));
    assert!(!has_path(&definition.edges, "review", "start"));
    assert_eq!(
        connection_error(review, approval, &definition.edges),
        Some(ConnectError::WouldCreateCycle)
    );
}

#[test]
fn condition_nodes_cap_at_two_branches() {
    let mut definition = GraphDefinition {
        nodes: vec![
            node("cond", NodeType::Condition),
            node("a", NodeType::Approval),
            node("b", NodeType::Approval),
            node("c", NodeType::Approval),
        ],
        ..GraphDefinition::default()
    };
    definition.edges.push(edge("e1", "cond", "a", 1));
    let b = definition.node("b").unwrap().clone();
    let cond = definition.node("cond").unwrap().clone();
    assert_eq!(connection_error(&cond, &b, &definition.edges), None);

    definition.edges.push(edge("e2", "cond", "b", 2));
    let c = definition.node("c").unwrap();
    assert_eq!(
        connection_error(definition.node("cond").unwrap(), c, &definition.edges),
        Some(ConnectError::ConditionBranchLimit)
    );
}

#[test]
fn history_signature_ignores_regenerated_ids_and_order() {
    let mut left = default_definition();
    let mut right = default_definition();

    // Regenerated edge ids and reordered edge lists describe the same state.
    right.edges.reverse();
    for edge in &mut right.edges {
        edge.id = format!("{}_regen", edge.id);
    }
    // Regenerated group ids too.
    for definition in [&mut left, &mut right] {
        for node in &mut definition.nodes {
            shinsa::definition::ensure_node_groups(node);
        }
    }
    for node in &mut right.nodes {
        for group in &mut node.approver_groups {
            group.id = format!("{}_regen", group.id);
        }
    }
    assert_eq!(history_signature(&left), history_signature(&right));

    // A real change does move the signature.
    right.nodes[1].name = "Renamed".to_string();
    assert_ne!(history_signature(&left), history_signature(&right));
}

#[test]
fn steps_convert_to_a_linear_chain_and_back() {
    let raw_steps = json!([
        {"step_no": 1, "name": "Team lead", "approval_type": "any", "approver_type": "manager"},
        {"step_no": 2, "name": "Finance", "approval_type": "all", "approver_type": "role",
         "approver_roles": ["finance"]},
    ]);
    let steps: Vec<shinsa::definition::WorkflowStep> = serde_json::from_value(raw_steps).unwrap();
    let definition = steps_to_definition(&steps);

    assert_eq!(definition.nodes.len(), 4);
    assert_eq!(definition.nodes[1].name, "Team lead");
    assert_eq!(definition.nodes[2].approver_roles, vec!["finance"]);
    assert!(definition.nodes[1].approver_groups.len() >= 1);
    assert!(has_path(&definition.edges, "start", "end"));

    let extracted = extract_steps(&definition);
    assert_eq!(extracted.len(), 2);
    assert_eq!(extracted[0].step_no, 1);
    assert_eq!(extracted[0].name, "Team lead");
    assert_eq!(extracted[1].approver_roles, vec!["finance"]);
}

#[test]
fn extract_steps_walks_through_pass_through_nodes() {
    let mut definition = default_definition();
    definition.nodes.push(node("cond", NodeType::Condition));
    definition.nodes.push(node("b", NodeType::Approval));
    // approval_1 -> cond replaces approval_1 -> end
    definition.edges.retain(|e| e.id != "e_approval_1_end");
    definition.edges.push(edge("e1", "approval_1", "cond", 2));
    definition.edges.push(edge("e2", "cond", "b", 3));
    definition.edges.push(edge("e3", "b", "end", 4));

    let steps = extract_steps(&definition);
    // The walk follows the chain through the condition node but only
    // approval nodes become steps.
    assert!(steps.iter().all(|s| !s.name.is_empty()));
    assert_eq!(steps.first().map(|s| s.name.as_str()), Some("Approval"));
}

#[test]
fn hydrated_priority_falls_back_to_list_position() {
    let raw = json!({
        "nodes": [{"id": "a", "node_type": "start"}, {"id": "b", "node_type": "end"}],
        "edges": [{"id": "e", "source": "a", "target": "b"}],
    });
    let definition = GraphDefinition::from_value(&raw);
    assert_eq!(definition.edges[0].priority, 1);
}

#[test]
fn definitions_round_trip_through_serde_and_hydration() {
    let definition = default_definition();
    let text = serde_json::to_string(&definition).unwrap();
    let back: GraphDefinition = serde_json::from_str(&text).unwrap();
    assert_eq!(definition, back);

    let value: Value = serde_json::from_str(&text).unwrap();
    let hydrated = GraphDefinition::from_value(&value);
    assert_eq!(hydrated.nodes.len(), definition.nodes.len());
    assert_eq!(hydrated.edges.len(), definition.edges.len());
}
