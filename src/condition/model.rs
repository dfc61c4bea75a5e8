use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Combinator between the rules of a condition (or between its blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionLogic {
    #[default]
    And,
    Or,
}

impl ConditionLogic {
    /// The textual join used when synthesizing expressions.
    pub fn joiner(self) -> &'static str {
        match self {
            ConditionLogic::And => " and ",
            ConditionLogic::Or => " or ",
        }
    }

    /// Lenient parse used during hydration; anything that is not "or" is "and".
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("or") {
            ConditionLogic::Or
        } else {
            ConditionLogic::And
        }
    }
}

/// Comparison operator of a single structured rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    #[default]
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Contains,
    IsTrue,
    IsFalse,
    IsEmpty,
    NotEmpty,
}

impl RuleOperator {
    pub const ALL: [RuleOperator; 13] = [
        RuleOperator::Eq,
        RuleOperator::Neq,
        RuleOperator::Gt,
        RuleOperator::Gte,
        RuleOperator::Lt,
        RuleOperator::Lte,
        RuleOperator::In,
        RuleOperator::NotIn,
        RuleOperator::Contains,
        RuleOperator::IsTrue,
        RuleOperator::IsFalse,
        RuleOperator::IsEmpty,
        RuleOperator::NotEmpty,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleOperator::Eq => "eq",
            RuleOperator::Neq => "neq",
            RuleOperator::Gt => "gt",
            RuleOperator::Gte => "gte",
            RuleOperator::Lt => "lt",
            RuleOperator::Lte => "lte",
            RuleOperator::In => "in",
            RuleOperator::NotIn => "not_in",
            RuleOperator::Contains => "contains",
            RuleOperator::IsTrue => "is_true",
            RuleOperator::IsFalse => "is_false",
            RuleOperator::IsEmpty => "is_empty",
            RuleOperator::NotEmpty => "not_empty",
        }
    }

    /// True for operators that test the field alone and carry no value.
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            RuleOperator::IsTrue
                | RuleOperator::IsFalse
                | RuleOperator::IsEmpty
                | RuleOperator::NotEmpty
        )
    }

    /// Lenient parse used during hydration; unknown operators fall back to `eq`.
    pub fn from_raw(raw: &str) -> Self {
        let text = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == text)
            .unwrap_or(RuleOperator::Eq)
    }
}

impl fmt::Display for RuleOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured rule: a form field compared against a literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRule {
    pub field: String,
    pub operator: RuleOperator,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
}

impl ConditionRule {
    pub fn new(field: impl Into<String>, operator: RuleOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// A rule contributes to an expression only when its field name is non-blank.
    pub fn is_usable(&self) -> bool {
        !self.field.trim().is_empty()
    }

    /// Returns the rule with its field name trimmed, or `None` when blank.
    pub fn trimmed(&self) -> Option<ConditionRule> {
        let field = self.field.trim();
        if field.is_empty() {
            return None;
        }
        Some(ConditionRule {
            field: field.to_string(),
            operator: self.operator,
            value: self.value.clone(),
        })
    }
}

/// A boolean predicate over submitted form data.
///
/// Either `rules` (joined by `logic`) or a pre-synthesized `expression` carries
/// the predicate. A condition with neither is "always true" and must be
/// represented as an absent `Option<Condition>`, never as an empty object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub logic: ConditionLogic,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default)]
    pub rules: Vec<ConditionRule>,
}

impl Condition {
    /// Builds a rules-only condition.
    pub fn from_rules(logic: ConditionLogic, rules: Vec<ConditionRule>) -> Self {
        Self {
            logic,
            expression: None,
            rules,
        }
    }

    /// The usable rules of this condition (blank field names dropped).
    pub fn usable_rules(&self) -> Vec<ConditionRule> {
        self.rules.iter().filter_map(ConditionRule::trimmed).collect()
    }

    /// True when neither rules nor an expression carry any predicate.
    pub fn is_vacuous(&self) -> bool {
        self.usable_rules().is_empty()
            && self
                .expression
                .as_deref()
                .is_none_or(|text| text.trim().is_empty())
    }

    /// Lenient hydration from untyped JSON.
    ///
    /// Malformed rules are dropped field-by-field; a condition that ends up
    /// vacuous is reported as `None` (the absent-condition invariant). Never
    /// errors: corrupt stored data must not block the editor from loading.
    pub fn from_value(raw: &Value) -> Option<Condition> {
        let object = raw.as_object()?;
        let logic = object
            .get("logic")
            .and_then(Value::as_str)
            .map(ConditionLogic::from_raw)
            .unwrap_or_default();
        let expression = object
            .get("expression")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        let mut rules = Vec::new();
        if let Some(raw_rules) = object.get("rules").and_then(Value::as_array) {
            for raw_rule in raw_rules {
                let Some(rule) = raw_rule.as_object() else {
                    continue;
                };
                let field = rule
                    .get("field")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or("");
                if field.is_empty() {
                    continue;
                }
                let operator = rule
                    .get("operator")
                    .and_then(Value::as_str)
                    .map(RuleOperator::from_raw)
                    .unwrap_or_default();
                let value = rule.get("value").cloned().unwrap_or(Value::Null);
                rules.push(ConditionRule::new(field, operator, value));
            }
        }

        let condition = Condition {
            logic,
            expression,
            rules,
        };
        if condition.is_vacuous() {
            None
        } else {
            Some(condition)
        }
    }
}

/// Explicit classification of a persisted condition's shape.
///
/// The designer historically inferred the shape (single rule block, joined
/// multi-block expression, raw expression) from which fields happened to be
/// populated. The classification is a total mapping instead: every non-vacuous
/// condition falls in exactly one variant, and each variant maps back to a
/// canonical `Condition`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionForm {
    /// Structured rules only; round-trips losslessly through the draft editor.
    SingleBlock {
        logic: ConditionLogic,
        rules: Vec<ConditionRule>,
    },
    /// Expression only, either hand-written or synthesized from multiple blocks.
    RawExpression {
        logic: ConditionLogic,
        expression: String,
    },
    /// Both structured rules and an expression were persisted.
    Mixed {
        logic: ConditionLogic,
        rules: Vec<ConditionRule>,
        expression: String,
    },
}

impl ConditionForm {
    /// Classifies a condition; `None` means "no condition" (vacuous).
    pub fn classify(condition: &Condition) -> Option<ConditionForm> {
        let rules = condition.usable_rules();
        let expression = condition
            .expression
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        match (rules.is_empty(), expression) {
            (true, None) => None,
            (false, None) => Some(ConditionForm::SingleBlock {
                logic: condition.logic,
                rules,
            }),
            (true, Some(expression)) => Some(ConditionForm::RawExpression {
                logic: condition.logic,
                expression,
            }),
            (false, Some(expression)) => Some(ConditionForm::Mixed {
                logic: condition.logic,
                rules,
                expression,
            }),
        }
    }

    /// Maps the classification back to its canonical condition.
    pub fn into_condition(self) -> Condition {
        match self {
            ConditionForm::SingleBlock { logic, rules } => Condition {
                logic,
                expression: None,
                rules,
            },
            ConditionForm::RawExpression { logic, expression } => Condition {
                logic,
                expression: Some(expression),
                rules: Vec::new(),
            },
            ConditionForm::Mixed {
                logic,
                rules,
                expression,
            } => Condition {
                logic,
                expression: Some(expression),
                rules,
            },
        }
    }
}
