use serde::Serialize;
use thiserror::Error;

use super::model::HitPolicy;
use crate::eval::Value;

/// Outcome of one input cell of one rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnTrace {
    pub input_id: String,
    pub entry: String,
    pub observed: Value,
    pub matched: bool,
    /// Parse or evaluation failure that was downgraded to "no match".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleTrace {
    pub rule_id: String,
    pub matched: bool,
    pub columns: Vec<ColumnTrace>,
}

/// Every match of a COLLECT evaluation, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectMetadata {
    pub count: usize,
    pub decisions: Vec<Value>,
    pub rule_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionResult {
    pub decision_id: String,
    pub hit_policy: HitPolicy,
    /// `None` when no rule matched under a policy that allows it.
    pub output: Option<Value>,
    pub matched_rules: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collect: Option<CollectMetadata>,
    /// Every evaluated rule, in declaration order.
    pub trace: Vec<RuleTrace>,
}

impl DecisionResult {
    pub fn has_decision(&self) -> bool {
        self.output.is_some()
    }

    /// The decision, or `Null` when there is none.
    pub fn value(&self) -> Value {
        self.output.clone().unwrap_or_default()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HitPolicyViolation {
    #[error("hit policy UNIQUE: none matched")]
    NoMatch,
    #[error("hit policy UNIQUE: {count} rules matched ({})", .rule_ids.join(", "))]
    MultipleMatches { count: usize, rule_ids: Vec<String> },
    #[error("hit policy ANY: matching rules disagree ({})", describe(.rule_ids, .outputs))]
    ConflictingOutputs {
        rule_ids: Vec<String>,
        outputs: Vec<Value>,
    },
}

fn describe(rule_ids: &[String], outputs: &[Value]) -> String {
    rule_ids
        .iter()
        .zip(outputs)
        .map(|(id, output)| format!("{} => {}", id, output))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecisionError {
    #[error(transparent)]
    HitPolicy(#[from] HitPolicyViolation),
    #[error("output {output} of rule {rule} cannot be evaluated: {message}")]
    Output {
        rule: String,
        output: String,
        message: String,
    },
}
