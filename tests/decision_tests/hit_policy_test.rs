use handan::decision::CollectMetadata;
use handan::{DecisionEngine, DecisionError, HitPolicy, HitPolicyViolation, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

use super::single_input_table;
use crate::context;

#[test]
fn test_first_policy() {
    let table = single_input_table(
        HitPolicy::First,
        "age",
        &[("< 18", "reject"), (">= 18", "approve")],
    );
    let engine = DecisionEngine::new();

    let adult = engine.evaluate(&table, &context(json!({"age": 25}))).unwrap();
    assert_eq!(adult.value(), Value::from("approve"));
    let minor = engine.evaluate(&table, &context(json!({"age": 10}))).unwrap();
    assert_eq!(minor.value(), Value::from("reject"));
    assert_eq!(minor.trace.len(), 1);
}

#[test]
fn test_unique_policy_with_disjoint_rules() {
    let table = single_input_table(
        HitPolicy::Unique,
        "value",
        &[(">= 10", "approved"), ("< 10", "rejected")],
    );
    let engine = DecisionEngine::new();

    let high = engine.evaluate(&table, &context(json!({"value": 15}))).unwrap();
    assert_eq!(high.value(), Value::from("approved"));
    let low = engine.evaluate(&table, &context(json!({"value": 5}))).unwrap();
    assert_eq!(low.value(), Value::from("rejected"));
    assert_eq!(low.matched_rules, vec!["r2"]);
}

#[test]
fn test_unique_policy_with_overlap_fails() {
    let table = single_input_table(HitPolicy::Unique, "value", &[(">= 5", "a"), (">= 10", "b")]);
    let err = DecisionEngine::new()
        .evaluate(&table, &context(json!({"value": 15})))
        .unwrap_err();
    assert_eq!(
        err,
        DecisionError::HitPolicy(HitPolicyViolation::MultipleMatches {
            count: 2,
            rule_ids: vec!["r1".to_string(), "r2".to_string()],
        })
    );
    assert!(err.to_string().contains("2 rules matched"));
}

#[test]
fn test_any_policy() {
    let agreeing = single_input_table(
        HitPolicy::Any,
        "value",
        &[(">= 5", "approved"), (">= 10", "approved")],
    );
    let engine = DecisionEngine::new();
    let result = engine
        .evaluate(&agreeing, &context(json!({"value": 15})))
        .unwrap();
    assert_eq!(result.value(), Value::from("approved"));

    let disagreeing = single_input_table(
        HitPolicy::Any,
        "value",
        &[(">= 5", "approved"), (">= 10", "rejected")],
    );
    assert!(matches!(
        engine.evaluate(&disagreeing, &context(json!({"value": 15}))),
        Err(DecisionError::HitPolicy(HitPolicyViolation::ConflictingOutputs { .. }))
    ));
}

#[test]
fn test_collect_policy() {
    let table = single_input_table(
        HitPolicy::Collect,
        "value",
        &[("> 0", "rule_a"), ("> 5", "rule_b"), ("> 50", "rule_c")],
    );
    let result = DecisionEngine::new()
        .evaluate(&table, &context(json!({"value": 10})))
        .unwrap();
    assert_eq!(result.value(), Value::from("rule_a"));
    assert_eq!(
        result.collect,
        Some(CollectMetadata {
            count: 2,
            decisions: vec![Value::from("rule_a"), Value::from("rule_b")],
            rule_ids: vec!["r1".to_string(), "r2".to_string()],
        })
    );
    assert_eq!(result.trace.len(), 3);
}

#[test]
fn test_no_match_is_not_an_error_outside_unique() {
    for policy in [HitPolicy::First, HitPolicy::Priority, HitPolicy::Any, HitPolicy::Collect] {
        let table = single_input_table(policy, "value", &[("> 100", "big")]);
        let result = DecisionEngine::new()
            .evaluate(&table, &context(json!({"value": 1})))
            .unwrap();
        assert!(!result.has_decision(), "{}", policy);
        assert_eq!(result.value(), Value::Null);
    }
}

#[test]
fn test_erroring_cells_can_still_violate_unique() {
    let table = single_input_table(HitPolicy::Unique, "value", &[("> \"x\" +", "a"), ("< 0", "b")]);
    let err = DecisionEngine::new()
        .evaluate(&table, &context(json!({"value": 1})))
        .unwrap_err();
    assert_eq!(err, DecisionError::HitPolicy(HitPolicyViolation::NoMatch));
}
