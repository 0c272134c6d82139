use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conflict resolution between matching rules.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum HitPolicy {
    /// Exactly one rule may match.
    #[strum(to_string = "UNIQUE", serialize = "U")]
    Unique,
    /// The first matching rule in declaration order.
    #[strum(to_string = "FIRST", serialize = "F")]
    First,
    /// Declaration order stands in for priority, so this behaves as `First`.
    #[strum(to_string = "PRIORITY", serialize = "P")]
    Priority,
    /// Every matching rule must produce the same output.
    #[strum(to_string = "ANY", serialize = "A")]
    Any,
    /// The first match decides; every match is reported alongside.
    #[strum(to_string = "COLLECT", serialize = "C")]
    Collect,
}

impl HitPolicy {
    pub fn parse(name: &str) -> Result<Self, ModelError> {
        HitPolicy::from_str(name.trim()).map_err(|_| ModelError::UnknownHitPolicy(name.to_string()))
    }

    /// Whether evaluation may stop at the first matching rule.
    pub fn stops_at_first_match(&self) -> bool {
        matches!(self, HitPolicy::First | HitPolicy::Priority)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("unknown hit policy: {0:?}")]
    UnknownHitPolicy(String),
    #[error("rule {rule} has {actual} {kind} entries, table has {expected} {kind} columns")]
    ArityMismatch {
        rule: String,
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{0} id must not be empty")]
    EmptyId(&'static str),
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("decision table {0} has no output columns")]
    NoOutputs(String),
}

/// An input or output column.
///
/// For inputs, `expression` computes the observed value from the evaluation context (usually
/// just a field name). For outputs it is the value used when a rule leaves the cell empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub expression: String,
}

impl Column {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            expression: expression.into(),
        }
    }

    /// An input observing the context field of the same name.
    pub fn input(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name.clone(), name)
    }

    pub fn output(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name, "")
    }

    /// Label when present, id otherwise.
    pub fn name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl Rule {
    pub fn new<I, O>(id: impl Into<String>, inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            id: id.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }
}

/// Validated decision table. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDecisionTable", into = "RawDecisionTable")]
pub struct DecisionTable {
    id: String,
    hit_policy: HitPolicy,
    inputs: Vec<Column>,
    outputs: Vec<Column>,
    rules: Vec<Rule>,
    fingerprint: u64,
}

/// Serialized shape of a decision table, validated on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDecisionTable {
    id: String,
    hit_policy: String,
    #[serde(default)]
    inputs: Vec<Column>,
    outputs: Vec<Column>,
    #[serde(default)]
    rules: Vec<Rule>,
}

impl TryFrom<RawDecisionTable> for DecisionTable {
    type Error = ModelError;

    fn try_from(raw: RawDecisionTable) -> Result<Self, Self::Error> {
        DecisionTable::new(
            raw.id,
            HitPolicy::parse(&raw.hit_policy)?,
            raw.inputs,
            raw.outputs,
            raw.rules,
        )
    }
}

impl From<DecisionTable> for RawDecisionTable {
    fn from(table: DecisionTable) -> Self {
        RawDecisionTable {
            id: table.id,
            hit_policy: table.hit_policy.to_string(),
            inputs: table.inputs,
            outputs: table.outputs,
            rules: table.rules,
        }
    }
}

impl DecisionTable {
    pub fn new(
        id: impl Into<String>,
        hit_policy: HitPolicy,
        inputs: Vec<Column>,
        outputs: Vec<Column>,
        rules: Vec<Rule>,
    ) -> Result<Self, ModelError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ModelError::EmptyId("decision table"));
        }
        if outputs.is_empty() {
            return Err(ModelError::NoOutputs(id));
        }
        check_ids("input", inputs.iter().map(|c| c.id.as_str()))?;
        check_ids("output", outputs.iter().map(|c| c.id.as_str()))?;
        check_ids("rule", rules.iter().map(|r| r.id.as_str()))?;
        for rule in &rules {
            if rule.inputs.len() != inputs.len() {
                return Err(ModelError::ArityMismatch {
                    rule: rule.id.clone(),
                    kind: "input",
                    expected: inputs.len(),
                    actual: rule.inputs.len(),
                });
            }
            if rule.outputs.len() != outputs.len() {
                return Err(ModelError::ArityMismatch {
                    rule: rule.id.clone(),
                    kind: "output",
                    expected: outputs.len(),
                    actual: rule.outputs.len(),
                });
            }
        }

        let mut hasher = DefaultHasher::new();
        (&id, hit_policy, &inputs, &outputs, &rules).hash(&mut hasher);
        Ok(Self {
            id,
            hit_policy,
            inputs,
            outputs,
            rules,
            fingerprint: hasher.finish(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn hit_policy(&self) -> HitPolicy {
        self.hit_policy
    }

    pub fn inputs(&self) -> &[Column] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Column] {
        &self.outputs
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Stable hash over the id, hit policy, columns and rules.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

fn check_ids<'a>(kind: &'static str, ids: impl Iterator<Item = &'a str>) -> Result<(), ModelError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(ModelError::EmptyId(kind));
        }
        if !seen.insert(id) {
            return Err(ModelError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
