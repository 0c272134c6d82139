use std::sync::Arc;
use std::thread;
use std::time::Duration;

use handan::{
    CacheConfig, Column, DecisionEngine, DecisionTable, EngineConfig, HitPolicy, Rule, Value,
};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::context;
use crate::decision_tests::single_input_table;

#[test]
fn test_cold_and_warm_results_match() {
    let table = single_input_table(
        HitPolicy::Collect,
        "value",
        &[("> 0", "rule_a"), ("> 5", "rule_b")],
    );
    let engine = DecisionEngine::new();
    let ctx = context(json!({"value": 10}));

    let cold = engine.evaluate(&table, &ctx).unwrap();
    let warm = engine.evaluate(&table, &ctx).unwrap();
    let uncached = DecisionEngine::with_config(EngineConfig::uncached())
        .evaluate(&table, &ctx)
        .unwrap();
    assert_eq!(cold, warm);
    assert_eq!(cold, uncached);

    let stats = engine.cache_stats();
    assert_eq!(stats.result.hits, 1);
    assert_eq!(stats.result.misses, 1);
    // input expression, two input cells, two output cells
    assert_eq!(stats.ast.size, 5);
}

#[test]
fn test_clear_caches_keeps_results() {
    let table = single_input_table(HitPolicy::First, "value", &[("-", "any")]);
    let engine = DecisionEngine::new();
    let ctx = context(json!({"value": 1}));
    let before = engine.evaluate(&table, &ctx).unwrap();
    engine.clear_caches();
    assert_eq!(engine.cache_stats().result.size, 0);
    assert_eq!(engine.evaluate(&table, &ctx).unwrap(), before);
}

#[test]
fn test_expired_results_are_recomputed() {
    let config = EngineConfig {
        result_cache: CacheConfig {
            ttl: Duration::from_millis(20),
            ..CacheConfig::default()
        },
        ..EngineConfig::default()
    };
    let table = single_input_table(HitPolicy::First, "value", &[("-", "any")]);
    let engine = DecisionEngine::with_config(config);
    let ctx = context(json!({"value": 1}));
    engine.evaluate(&table, &ctx).unwrap();
    thread::sleep(Duration::from_millis(40));
    engine.evaluate(&table, &ctx).unwrap();
    assert_eq!(engine.cache_stats().result.hits, 0);
}

#[test]
fn test_concurrent_evaluation() {
    let table = Arc::new(single_input_table(
        HitPolicy::Unique,
        "value",
        &[("< 50", "low"), (">= 50", "high")],
    ));
    let engine = Arc::new(DecisionEngine::new());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let table = Arc::clone(&table);
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..100 {
                    let value = (worker * 100 + i) % 100;
                    let result = engine
                        .evaluate(&table, &context(json!({ "value": value })))
                        .unwrap();
                    let expected = if value < 50 { "low" } else { "high" };
                    assert_eq!(result.value(), Value::from(expected));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = engine.cache_stats();
    assert_eq!(stats.result.hits + stats.result.misses, 800);
    assert!(stats.result.size <= 100);
}

#[test]
fn test_config_from_json() {
    let config: EngineConfig = handan::config::from_str(
        r#"{"ast_cache": {"capacity": 2, "ttl": 0}, "result_cache": {"enabled": false}}"#,
    )
    .unwrap();
    assert_eq!(config.ast_cache.capacity, 2);
    assert_eq!(config.ast_cache.ttl, Duration::ZERO);
    assert!(!config.result_cache.enabled);

    let engine = DecisionEngine::with_config(config);
    let ctx = context(json!({}));
    for text in ["1", "2", "3"] {
        engine.evaluate_expression(text, &ctx).unwrap();
    }
    assert_eq!(engine.cache_stats().ast.size, 2);
    assert_eq!(engine.cache_stats().result.size, 0);
}

#[test]
fn test_nested_contexts_do_not_share_results() {
    let engine = DecisionEngine::new();
    for policy in [HitPolicy::Priority, HitPolicy::Any] {
        let table = DecisionTable::new(
            "tiers",
            policy,
            vec![Column::new("tier", "", "applicant.tier")],
            vec![Column::output("offer")],
            vec![
                Rule::new("gold", ["\"gold\""], ["premium"]),
                Rule::new("silver", ["\"silver\""], ["standard"]),
            ],
        )
        .unwrap();
        let gold = context(json!({"applicant": {"tier": "gold", "age": 40}}));
        let silver = context(json!({"applicant": {"tier": "silver", "age": 40}}));

        for _ in 0..2 {
            assert_eq!(
                engine.evaluate(&table, &gold).unwrap().value(),
                Value::from("premium")
            );
            assert_eq!(
                engine.evaluate(&table, &silver).unwrap().value(),
                Value::from("standard")
            );
        }
    }
    let stats = engine.cache_stats();
    assert_eq!(stats.result.misses, 4);
    assert_eq!(stats.result.hits, 4);
}
