use handan::decision::ModelError;
use handan::{Column, DecisionEngine, DecisionTable, HitPolicy, Rule, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::context;

fn loan_table() -> DecisionTable {
    serde_json::from_value(json!({
        "id": "loan",
        "hit_policy": "f",
        "inputs": [
            {"id": "score", "label": "Credit Score", "expression": "applicant.score"},
            {"id": "purpose", "expression": "applicant.purpose"}
        ],
        "outputs": [
            {"id": "decision"},
            {"id": "rate", "label": "Rate", "expression": "0.1"}
        ],
        "rules": [
            {"id": "excellent", "inputs": ["[750..850]", "-"], "outputs": ["approve", "0.03"]},
            {"id": "car", "inputs": ["[650..750)", "\"car\", \"home\""], "outputs": ["approve", ""]},
            {"id": "negated", "inputs": ["< 650", "not(\"car\")"], "outputs": ["refer", "score / 10000"]},
            {"id": "rest", "inputs": ["-", "-"], "outputs": ["reject", "null"]}
        ]
    }))
    .unwrap()
}

#[test]
fn test_table_from_json() {
    let engine = DecisionEngine::new();
    let table = loan_table();
    assert_eq!(table.hit_policy(), HitPolicy::First);

    let excellent = engine
        .evaluate(&table, &context(json!({"applicant": {"score": 800, "purpose": "boat"}})))
        .unwrap();
    assert_eq!(excellent.value().property("decision"), Value::from("approve"));
    assert_eq!(excellent.value().property("Rate"), Value::from(0.03));

    let car = engine
        .evaluate(&table, &context(json!({"applicant": {"score": 700, "purpose": "car"}})))
        .unwrap();
    assert_eq!(car.matched_rules, vec!["car"]);
    assert_eq!(car.value().property("Rate"), Value::from(0.1));

    let rest = engine
        .evaluate(&table, &context(json!({"applicant": {"score": 700, "purpose": "boat"}})))
        .unwrap();
    assert_eq!(rest.matched_rules, vec!["rest"]);
    assert_eq!(rest.value().property("Rate"), Value::Null);
}

#[test]
fn test_outputs_read_the_caller_context() {
    let refer = DecisionEngine::new()
        .evaluate(
            &loan_table(),
            &context(json!({"applicant": {"score": 600, "purpose": "boat"}, "score": 600})),
        )
        .unwrap();
    assert_eq!(refer.matched_rules, vec!["negated"]);
    assert_eq!(refer.value().property("Rate"), Value::from(0.06));
}

#[test]
fn test_trace_records_observed_values() {
    let result = DecisionEngine::new()
        .evaluate(
            &loan_table(),
            &context(json!({"applicant": {"score": 700, "purpose": "home"}})),
        )
        .unwrap();
    let car = &result.trace[1];
    assert!(car.matched);
    assert_eq!(car.columns[0].observed, Value::from(700.0));
    assert_eq!(car.columns[1].observed, Value::from("home"));
    assert!(!result.trace[0].columns[0].matched);
    assert!(result.trace[0].columns[1].matched);
}

#[test]
fn test_invalid_tables_are_rejected_at_construction() {
    let err = DecisionTable::new(
        "t",
        HitPolicy::First,
        vec![Column::input("a"), Column::input("b")],
        vec![Column::output("out")],
        vec![Rule::new("r1", ["1"], ["x"])],
    )
    .unwrap_err();
    assert!(matches!(err, ModelError::ArityMismatch { expected: 2, actual: 1, .. }));

    let err = serde_json::from_value::<DecisionTable>(json!({
        "id": "t",
        "hit_policy": "RULE ORDER",
        "outputs": [{"id": "out"}]
    }))
    .unwrap_err();
    assert!(err.to_string().contains("RULE ORDER"));
}

#[test]
fn test_table_round_trips_through_json() {
    let table = loan_table();
    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json["hit_policy"], "FIRST");
    let back: DecisionTable = serde_json::from_value(json).unwrap();
    assert_eq!(back, table);
    assert_eq!(back.fingerprint(), table.fingerprint());
}

#[test]
fn test_free_text_outputs() {
    let table = crate::decision_tests::single_input_table(
        HitPolicy::First,
        "score",
        &[("> 50", "high-risk"), ("-", "manual review")],
    );
    let engine = DecisionEngine::new();
    assert_eq!(
        engine.evaluate(&table, &context(json!({"score": 80}))).unwrap().value(),
        Value::from("high-risk")
    );
    assert_eq!(
        engine.evaluate(&table, &context(json!({"score": 10}))).unwrap().value(),
        Value::from("manual review")
    );

    // a name the context does supply is still evaluated
    let shadowed = engine
        .evaluate(&table, &context(json!({"score": 80, "high": 5, "risk": 2})))
        .unwrap();
    assert_eq!(shadowed.value(), Value::from(3.0));
}
