//! Editable draft form of a condition and its round-trip with the wire model.
//!
//! The draft is what a condition editor binds to: one or more rule blocks plus
//! an optional manual expression. Converting a draft back to a [`Condition`]
//! canonicalizes it; converting a stored condition into a draft goes through
//! the [`ConditionForm`] classification so every persisted shape lands in a
//! well-defined editor state.

use serde::{Deserialize, Serialize};

use super::expression::block_expression;
use super::model::{Condition, ConditionForm, ConditionLogic, ConditionRule, RuleOperator};

/// One group of rules in the editor, joined by its own logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionBlock {
    pub id: String,
    pub logic: ConditionLogic,
    pub rules: Vec<ConditionRule>,
}

impl ConditionBlock {
    pub fn new(id: impl Into<String>, logic: ConditionLogic, rules: Vec<ConditionRule>) -> Self {
        Self {
            id: id.into(),
            logic,
            rules,
        }
    }

    /// True when at least one rule has a non-blank field.
    pub fn is_active(&self) -> bool {
        self.rules.iter().any(ConditionRule::is_usable)
    }
}

/// The full editor state for one condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDraft {
    pub logic: ConditionLogic,
    pub blocks: Vec<ConditionBlock>,
    /// Manually entered expression appended after the block fragments.
    #[serde(default)]
    pub expression: String,
}

impl ConditionDraft {
    /// An empty draft with one seeded block, as shown when a branch has no
    /// condition yet.
    pub fn empty(default_field: &str) -> Self {
        Self {
            logic: ConditionLogic::Or,
            blocks: vec![seeded_block(0, default_field)],
            expression: String::new(),
        }
    }
}

fn seeded_block(seq: usize, default_field: &str) -> ConditionBlock {
    ConditionBlock::new(
        block_id(seq),
        ConditionLogic::And,
        vec![ConditionRule::new(
            default_field,
            RuleOperator::Eq,
            serde_json::Value::Null,
        )],
    )
}

/// Deterministic block id for the `seq`-th block created in a draft.
pub fn block_id(seq: usize) -> String {
    format!("cond_block_{seq}")
}

/// Canonicalizes a draft into its stored condition.
///
/// Blocks with no usable rule are ignored. A single active block with no
/// manual expression becomes a rules-only condition (lossless round-trip);
/// anything richer is synthesized into a joined expression with empty rules.
/// A draft with nothing usable at all maps to `None`.
pub fn draft_to_condition(draft: &ConditionDraft) -> Option<Condition> {
    let active: Vec<&ConditionBlock> = draft
        .blocks
        .iter()
        .filter(|block| block.is_active())
        .collect();
    let manual = draft.expression.trim();

    if manual.is_empty() {
        match active.as_slice() {
            [] => return None,
            [block] => {
                let rules: Vec<ConditionRule> =
                    block.rules.iter().filter_map(ConditionRule::trimmed).collect();
                return Some(Condition::from_rules(block.logic, rules));
            }
            _ => {}
        }
    } else if active.is_empty() {
        return Some(Condition {
            logic: draft.logic,
            expression: Some(manual.to_string()),
            rules: Vec::new(),
        });
    }

    let mut fragments: Vec<String> = active.iter().filter_map(|b| block_expression(b)).collect();
    if !manual.is_empty() {
        fragments.push(format!("({manual})"));
    }
    if fragments.is_empty() {
        return None;
    }
    Some(Condition {
        logic: draft.logic,
        expression: Some(fragments.join(draft.logic.joiner())),
        rules: Vec::new(),
    })
}

/// Opens a stored condition in the editor.
///
/// `default_field` seeds the first rule of a fresh block so the editor never
/// shows an empty field picker.
pub fn condition_to_draft(condition: Option<&Condition>, default_field: &str) -> ConditionDraft {
    let Some(form) = condition.and_then(ConditionForm::classify) else {
        return ConditionDraft::empty(default_field);
    };
    match form {
        ConditionForm::SingleBlock { logic, rules } => ConditionDraft {
            logic: ConditionLogic::Or,
            blocks: vec![ConditionBlock::new(block_id(0), logic, rules)],
            expression: String::new(),
        },
        ConditionForm::RawExpression { logic, expression } => ConditionDraft {
            logic,
            blocks: vec![seeded_block(0, default_field)],
            expression,
        },
        ConditionForm::Mixed {
            logic,
            rules,
            expression,
        } => ConditionDraft {
            logic,
            blocks: vec![ConditionBlock::new(block_id(0), logic, rules)],
            expression,
        },
    }
}
