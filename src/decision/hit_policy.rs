//! Hit policy resolution over the rules that matched, in declaration order.

use tracing::warn;

use super::model::HitPolicy;
use super::result::{CollectMetadata, HitPolicyViolation};
use crate::eval::Value;

/// A matching rule with its evaluated output.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub rule_id: String,
    pub output: Value,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolution {
    pub output: Option<Value>,
    pub matched_rules: Vec<String>,
    pub collect: Option<CollectMetadata>,
}

/// Checks the number of matches before any output is evaluated.
pub fn check_count(policy: HitPolicy, matched_rule_ids: &[&str]) -> Result<(), HitPolicyViolation> {
    if policy != HitPolicy::Unique {
        return Ok(());
    }
    match matched_rule_ids.len() {
        0 => {
            warn!(%policy, "no rule matched");
            Err(HitPolicyViolation::NoMatch)
        }
        1 => Ok(()),
        count => {
            warn!(%policy, count, "more than one rule matched");
            Err(HitPolicyViolation::MultipleMatches {
                count,
                rule_ids: matched_rule_ids.iter().map(|id| id.to_string()).collect(),
            })
        }
    }
}

/// Picks the decision among `matches`, which must be in declaration order and already
/// accepted by [`check_count`].
pub fn resolve(policy: HitPolicy, matches: Vec<Match>) -> Result<Resolution, HitPolicyViolation> {
    match policy {
        HitPolicy::Unique | HitPolicy::First | HitPolicy::Priority => {
            Ok(matches.into_iter().next().map_or_else(Resolution::default, |first| {
                Resolution {
                    output: Some(first.output),
                    matched_rules: vec![first.rule_id],
                    collect: None,
                }
            }))
        }
        HitPolicy::Any => {
            let agree = matches.windows(2).all(|pair| pair[0].output == pair[1].output);
            if !agree {
                warn!(%policy, count = matches.len(), "matching rules disagree");
                let (rule_ids, outputs) = matches
                    .into_iter()
                    .map(|m| (m.rule_id, m.output))
                    .unzip();
                return Err(HitPolicyViolation::ConflictingOutputs { rule_ids, outputs });
            }
            let output = matches.first().map(|m| m.output.clone());
            Ok(Resolution {
                output,
                matched_rules: matches.into_iter().map(|m| m.rule_id).collect(),
                collect: None,
            })
        }
        HitPolicy::Collect => {
            let output = matches.first().map(|m| m.output.clone());
            let (rule_ids, decisions): (Vec<String>, Vec<Value>) = matches
                .into_iter()
                .map(|m| (m.rule_id, m.output))
                .unzip();
            Ok(Resolution {
                output,
                matched_rules: rule_ids.clone(),
                collect: Some(CollectMetadata {
                    count: rule_ids.len(),
                    decisions,
                    rule_ids,
                }),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rule_id: &str, output: &str) -> Match {
        Match {
            rule_id: rule_id.to_string(),
            output: Value::from(output),
        }
    }

    #[test]
    fn test_unique() {
        assert_eq!(
            check_count(HitPolicy::Unique, &[]),
            Err(HitPolicyViolation::NoMatch)
        );
        assert_eq!(check_count(HitPolicy::Unique, &["r1"]), Ok(()));
        assert!(matches!(
            check_count(HitPolicy::Unique, &["r1", "r2"]),
            Err(HitPolicyViolation::MultipleMatches { count: 2, .. })
        ));
        assert_eq!(
            resolve(HitPolicy::Unique, vec![m("r1", "a")]).unwrap().output,
            Some(Value::from("a"))
        );
    }

    #[test]
    fn test_count_is_only_checked_for_unique() {
        for policy in [
            HitPolicy::First,
            HitPolicy::Priority,
            HitPolicy::Any,
            HitPolicy::Collect,
        ] {
            assert_eq!(check_count(policy, &[]), Ok(()));
            assert_eq!(check_count(policy, &["r1", "r2"]), Ok(()));
        }
    }

    #[test]
    fn test_first_and_priority_take_lowest_index() {
        for policy in [HitPolicy::First, HitPolicy::Priority] {
            let resolution = resolve(policy, vec![m("r2", "b"), m("r3", "c")]).unwrap();
            assert_eq!(resolution.output, Some(Value::from("b")));
            assert_eq!(resolution.matched_rules, vec!["r2"]);
            assert_eq!(resolve(policy, vec![]).unwrap(), Resolution::default());
        }
    }

    #[test]
    fn test_any() {
        let resolution = resolve(HitPolicy::Any, vec![m("r1", "ok"), m("r2", "ok")]).unwrap();
        assert_eq!(resolution.output, Some(Value::from("ok")));
        assert_eq!(resolution.matched_rules, vec!["r1", "r2"]);
        assert_eq!(
            resolve(HitPolicy::Any, vec![m("r1", "ok"), m("r2", "no")]),
            Err(HitPolicyViolation::ConflictingOutputs {
                rule_ids: vec!["r1".to_string(), "r2".to_string()],
                outputs: vec![Value::from("ok"), Value::from("no")],
            })
        );
        assert_eq!(resolve(HitPolicy::Any, vec![]).unwrap().output, None);
    }

    #[test]
    fn test_collect_reports_every_match() {
        let resolution = resolve(HitPolicy::Collect, vec![m("r1", "a"), m("r2", "b")]).unwrap();
        assert_eq!(resolution.output, Some(Value::from("a")));
        assert_eq!(
            resolution.collect,
            Some(CollectMetadata {
                count: 2,
                decisions: vec![Value::from("a"), Value::from("b")],
                rule_ids: vec!["r1".to_string(), "r2".to_string()],
            })
        );
        assert_eq!(resolve(HitPolicy::Collect, vec![]).unwrap().output, None);
    }
}
