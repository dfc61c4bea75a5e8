//! Synthesis of evaluable expressions from structured condition rules.
//!
//! The backend evaluates conditions as restricted Python boolean expressions
//! over `field("key")` accessors. Rules and blocks are rendered into that
//! dialect here, so a structured edit always produces exactly the text the
//! evaluator will see.

use serde_json::Value;

use super::draft::{ConditionBlock, ConditionDraft};
use super::model::{ConditionRule, RuleOperator};

/// Renders a JSON value as a Python literal.
///
/// `null`/`true`/`false` become `None`/`True`/`False`; strings are emitted
/// with JSON quoting, which is valid Python for the characters the guard
/// admits; arrays and objects recurse.
pub fn to_python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => Value::String(text.clone()).to_string(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(to_python_literal).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(entries) => {
            let parts: Vec<String> = entries
                .iter()
                .map(|(key, item)| {
                    format!(
                        "{}: {}",
                        Value::String(key.clone()),
                        to_python_literal(item)
                    )
                })
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

/// Renders one rule as an expression fragment, or `None` for a blank field.
pub fn rule_expression(rule: &ConditionRule) -> Option<String> {
    let field = rule.field.trim();
    if field.is_empty() {
        return None;
    }
    let accessor = format!("field({})", Value::String(field.to_string()));
    let literal = to_python_literal(&rule.value);
    let text = match rule.operator {
        RuleOperator::Eq => format!("{accessor} == {literal}"),
        RuleOperator::Neq => format!("{accessor} != {literal}"),
        RuleOperator::Gt => format!("float({accessor}) > float({literal})"),
        RuleOperator::Gte => format!("float({accessor}) >= float({literal})"),
        RuleOperator::Lt => format!("float({accessor}) < float({literal})"),
        RuleOperator::Lte => format!("float({accessor}) <= float({literal})"),
        RuleOperator::In => format!("{accessor} in {literal}"),
        RuleOperator::NotIn => format!("{accessor} not in {literal}"),
        RuleOperator::Contains => format!("contains({accessor}, {literal})"),
        RuleOperator::IsTrue => format!("bool({accessor}) is True"),
        RuleOperator::IsFalse => format!("bool({accessor}) is False"),
        RuleOperator::IsEmpty => format!("empty({accessor})"),
        RuleOperator::NotEmpty => format!("not empty({accessor})"),
    };
    Some(text)
}

/// Renders a draft block as an expression fragment.
///
/// Fragments are joined by the block's logic. A block with more than one
/// usable rule is parenthesized so it composes safely with sibling blocks;
/// a block with no usable rules yields `None`.
pub fn block_expression(block: &ConditionBlock) -> Option<String> {
    let fragments: Vec<String> = block.rules.iter().filter_map(rule_expression).collect();
    match fragments.len() {
        0 => None,
        1 => Some(fragments.into_iter().next().unwrap_or_default()),
        _ => Some(format!("({})", fragments.join(block.logic.joiner()))),
    }
}

/// Builds the read-only preview shown while editing a draft.
///
/// Block fragments come first, the manual expression (if any) last; the
/// pieces are joined by the draft's top-level logic.
pub fn preview_expression(draft: &ConditionDraft) -> String {
    let mut fragments: Vec<String> = draft.blocks.iter().filter_map(block_expression).collect();
    let manual = draft.expression.trim();
    if !manual.is_empty() {
        fragments.push(format!("({manual})"));
    }
    fragments.join(draft.logic.joiner())
}
