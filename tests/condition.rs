mod common;

use serde_json::json;

use common::{amount_condition, amount_rule};
use shinsa::condition::{
    Condition, ConditionBlock, ConditionDraft, ConditionForm, ConditionLogic, ConditionRule,
    ExpressionValidation, RuleOperator, block_id, block_expression, check_expression,
    condition_to_draft, draft_to_condition, preview_expression, rule_expression,
    to_python_literal,
};
use shinsa::error::ExpressionError;

#[test]
fn literals_render_in_python_form() {
    assert_eq!(to_python_literal(&json!(null)), "None");
    assert_eq!(to_python_literal(&json!(true)), "True");
    assert_eq!(to_python_literal(&json!(false)), "False");
    assert_eq!(to_python_literal(&json!(12.5)), "12.5");
    assert_eq!(to_python_literal(&json!("it's")), "\"it's\"");
    assert_eq!(to_python_literal(&json!([1, "a"])), "[1, \"a\"]");
    assert_eq!(to_python_literal(&json!({"k": 1})), "{\"k\": 1}");
}

#[test]
fn each_operator_maps_to_its_fragment() {
    let expr = |op, value| rule_expression(&amount_rule(op, value)).unwrap();
    assert_eq!(expr(RuleOperator::Eq, json!(5)), "field(\"amount\") == 5");
    assert_eq!(expr(RuleOperator::Neq, json!(5)), "field(\"amount\") != 5");
    assert_eq!(
        expr(RuleOperator::Gt, json!(5)),
        "float(field(\"amount\")) > float(5)"
    );
    assert_eq!(
        expr(RuleOperator::Lte, json!(5)),
        "float(field(\"amount\")) <= float(5)"
    );
    assert_eq!(
        expr(RuleOperator::In, json!(["a", "b"])),
        "field(\"amount\") in [\"a\", \"b\"]"
    );
    assert_eq!(
        expr(RuleOperator::NotIn, json!([1])),
        "field(\"amount\") not in [1]"
    );
    assert_eq!(
        expr(RuleOperator::Contains, json!("x")),
        "contains(field(\"amount\"), \"x\")"
    );
    assert_eq!(
        expr(RuleOperator::IsTrue, json!(null)),
        "bool(field(\"amount\")) is True"
    );
    assert_eq!(
        expr(RuleOperator::IsFalse, json!(null)),
        "bool(field(\"amount\")) is False"
    );
    assert_eq!(expr(RuleOperator::IsEmpty, json!(null)), "empty(field(\"amount\"))");
    assert_eq!(
        expr(RuleOperator::NotEmpty, json!(null)),
        "not empty(field(\"amount\"))"
    );
}

#[test]
fn blank_fields_produce_no_fragment() {
    assert!(rule_expression(&ConditionRule::new("  ", RuleOperator::Eq, json!(1))).is_none());
}

#[test]
fn blocks_parenthesize_only_when_joined() {
    let single = ConditionBlock::new(
        block_id(0),
        ConditionLogic::And,
        vec![amount_rule(RuleOperator::Eq, json!(1))],
    );
    assert_eq!(block_expression(&single).unwrap(), "field(\"amount\") == 1");

    let double = ConditionBlock::new(
        block_id(1),
        ConditionLogic::Or,
        vec![
            amount_rule(RuleOperator::Eq, json!(1)),
            amount_rule(RuleOperator::Eq, json!(2)),
        ],
    );
    assert_eq!(
        block_expression(&double).unwrap(),
        "(field(\"amount\") == 1 or field(\"amount\") == 2)"
    );
}

#[test]
fn single_block_drafts_round_trip_as_rules() {
    let condition = amount_condition();
    let draft = condition_to_draft(Some(&condition), "amount");
    assert_eq!(draft.blocks.len(), 1);
    assert!(draft.expression.is_empty());

    let back = draft_to_condition(&draft).unwrap();
    assert_eq!(back, condition);
    assert!(back.expression.is_none());
}

#[test]
fn multi_block_drafts_become_a_joined_expression() {
    let draft = ConditionDraft {
        logic: ConditionLogic::Or,
        blocks: vec![
            ConditionBlock::new(
                block_id(0),
                ConditionLogic::And,
                vec![
                    amount_rule(RuleOperator::Gt, json!(100)),
                    ConditionRule::new("urgent", RuleOperator::IsTrue, json!(null)),
                ],
            ),
            ConditionBlock::new(
                block_id(1),
                ConditionLogic::And,
                vec![amount_rule(RuleOperator::Lte, json!(10))],
            ),
        ],
        expression: String::new(),
    };
    let condition = draft_to_condition(&draft).unwrap();
    assert!(condition.rules.is_empty());
    assert_eq!(
        condition.expression.as_deref().unwrap(),
        "(float(field(\"amount\")) > float(100) and bool(field(\"urgent\")) is True) \
         or float(field(\"amount\")) <= float(10)"
    );
}

#[test]
fn manual_expressions_are_parenthesized_and_appended() {
    let draft = ConditionDraft {
        logic: ConditionLogic::And,
        blocks: vec![ConditionBlock::new(
            block_id(0),
            ConditionLogic::And,
            vec![amount_rule(RuleOperator::Gt, json!(1))],
        )],
        expression: "empty(field(\"note\"))".to_string(),
    };
    let condition = draft_to_condition(&draft).unwrap();
    assert_eq!(
        condition.expression.as_deref().unwrap(),
        "float(field(\"amount\")) > float(1) and (empty(field(\"note\")))"
    );
    assert_eq!(preview_expression(&draft), condition.expression.unwrap());
}

#[test]
fn empty_drafts_map_to_no_condition() {
    let draft = ConditionDraft {
        logic: ConditionLogic::Or,
        blocks: vec![ConditionBlock::new(block_id(0), ConditionLogic::And, vec![])],
        expression: "   ".to_string(),
    };
    assert!(draft_to_condition(&draft).is_none());
}

#[test]
fn raw_expression_conditions_open_with_a_seeded_block() {
    let condition = Condition {
        logic: ConditionLogic::And,
        expression: Some("field(\"x\") == 1".to_string()),
        rules: vec![],
    };
    let draft = condition_to_draft(Some(&condition), "amount");
    assert_eq!(draft.expression, "field(\"x\") == 1");
    assert_eq!(draft.blocks.len(), 1);
    assert_eq!(draft.blocks[0].rules[0].field, "amount");
}

#[test]
fn classification_is_total_over_non_vacuous_conditions() {
    assert!(ConditionForm::classify(&Condition {
        logic: ConditionLogic::And,
        expression: Some("  ".to_string()),
        rules: vec![ConditionRule::new("", RuleOperator::Eq, json!(1))],
    })
    .is_none());

    let mixed = Condition {
        logic: ConditionLogic::Or,
        expression: Some("x == 1".to_string()),
        rules: vec![amount_rule(RuleOperator::Eq, json!(1))],
    };
    match ConditionForm::classify(&mixed).unwrap() {
        ConditionForm::Mixed { logic, rules, expression } => {
            assert_eq!(logic, ConditionLogic::Or);
            assert_eq!(rules.len(), 1);
            assert_eq!(expression, "x == 1");
        }
        other => panic!("unexpected form: {other:?}"),
    }
}

#[test]
fn lenient_condition_parsing_drops_bad_rules() {
    let parsed = Condition::from_value(&json!({
        "logic": "OR",
        "rules": [
            {"field": "amount", "operator": "made_up", "value": 1},
            {"field": "   "},
            17,
        ],
    }))
    .unwrap();
    assert_eq!(parsed.logic, ConditionLogic::Or);
    assert_eq!(parsed.rules.len(), 1);
    assert_eq!(parsed.rules[0].operator, RuleOperator::Eq);

    assert!(Condition::from_value(&json!({"rules": []})).is_none());
    assert!(Condition::from_value(&json!("nope")).is_none());
}

#[test]
fn guard_accepts_well_formed_expressions() {
    assert!(check_expression("field(\"amount\") > 100 and not empty(field(\"note\"))").is_ok());
    assert!(check_expression("lower(field(\"dept\")) in [\"sales\", \"ops\"]").is_ok());
    assert!(check_expression("amount >= 10").is_ok());
}

#[test]
fn guard_rejects_dangerous_input() {
    assert_eq!(check_expression("   "), Err(ExpressionError::Empty));
    assert!(matches!(
        check_expression("field(\"a\").__class__"),
        Err(ExpressionError::ForbiddenToken(_))
    ));
    assert!(matches!(
        check_expression("x == 1; y == 2"),
        Err(ExpressionError::ForbiddenToken(_))
    ));
    assert_eq!(
        check_expression("amount = 1"),
        Err(ExpressionError::ForbiddenToken("=".to_string()))
    );
    assert_eq!(
        check_expression("lambda x: x"),
        Err(ExpressionError::ForbiddenToken("lambda".to_string()))
    );
    assert_eq!(
        check_expression("system(\"ls\")"),
        Err(ExpressionError::ForbiddenCall("system".to_string()))
    );
    assert!(matches!(
        check_expression("field(\"a\" > 1"),
        Err(ExpressionError::UnbalancedBracket { .. })
    ));
    assert!(matches!(
        check_expression("(field(\"a\")))"),
        Err(ExpressionError::UnbalancedBracket { .. })
    ));
    assert_eq!(
        check_expression("field(\"unterminated) == 1"),
        Err(ExpressionError::UnterminatedString)
    );
    // Operators inside string literals are harmless.
    assert!(check_expression("field(\"note\") == \"a = b; c\"").is_ok());
}

#[test]
fn local_guard_maps_to_the_validation_wire_shape() {
    let ok = ExpressionValidation::from_local_check("field(\"a\") == 1");
    assert!(ok.valid);
    assert!(ok.message.is_none());

    let bad = ExpressionValidation::from_local_check("import os");
    assert!(!bad.valid);
    assert!(bad.message.unwrap().contains("import"));
}
