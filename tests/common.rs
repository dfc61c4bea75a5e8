//! Shared fixtures for the integration tests.

use std::cell::Cell;
use std::rc::Rc;

use shinsa::canvas::{CanvasEngine, Clock, DEBOUNCE_MS};
use shinsa::condition::{Condition, ConditionLogic, ConditionRule, RuleOperator};
use shinsa::definition::{GraphDefinition, GraphEdge, GraphNode, NodeType, default_definition};

/// Hand-advanced clock shared between a test and the engine it drives.
#[derive(Clone, Default)]
pub struct FakeClock {
    now: Rc<Cell<u64>>,
}

#[allow(dead_code)]
impl FakeClock {
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// An engine loaded with the default three-node definition.
#[allow(dead_code)]
pub fn engine() -> (CanvasEngine, FakeClock) {
    engine_with(default_definition())
}

#[allow(dead_code)]
pub fn engine_with(definition: GraphDefinition) -> (CanvasEngine, FakeClock) {
    let clock = FakeClock::default();
    let engine = CanvasEngine::new(definition, Box::new(clock.clone()));
    (engine, clock)
}

/// Advances past the debounce window and polls once.
#[allow(dead_code)]
pub fn drain(engine: &mut CanvasEngine, clock: &FakeClock) -> Option<GraphDefinition> {
    clock.advance(DEBOUNCE_MS);
    engine.poll_emission()
}

#[allow(dead_code)]
pub fn node(id: &str, node_type: NodeType) -> GraphNode {
    GraphNode::new(id, node_type)
}

#[allow(dead_code)]
pub fn edge(id: &str, source: &str, target: &str, priority: i64) -> GraphEdge {
    GraphEdge::new(id, source, target, priority)
}

#[allow(dead_code)]
pub fn amount_rule(operator: RuleOperator, value: serde_json::Value) -> ConditionRule {
    ConditionRule::new("amount", operator, value)
}

#[allow(dead_code)]
pub fn amount_condition() -> Condition {
    Condition::from_rules(
        ConditionLogic::And,
        vec![amount_rule(RuleOperator::Gt, serde_json::json!(1000))],
    )
}
