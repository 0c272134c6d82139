//! Property-based tests for literal decoding, determinism and cache transparency.

use handan::{evaluate_expression, parse_expression, ContextMap, DecisionEngine, EngineConfig, Evaluator, Value};
use proptest::prelude::*;

fn decimal_literal() -> impl Strategy<Value = (String, f64)> {
    (0u32..1_000_000, proptest::option::of(0u32..1000)).prop_map(|(whole, fraction)| {
        let text = match fraction {
            Some(fraction) => format!("{}.{:03}", whole, fraction),
            None => whole.to_string(),
        };
        let expected = text.parse::<f64>().unwrap();
        (text, expected)
    })
}

fn arithmetic() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0u32..100).prop_map(|n| n.to_string()),
        Just("x".to_string()),
        Just("y".to_string()),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        (
            inner.clone(),
            prop::sample::select(vec!["+", "-", "*", "<", "=", "and", "or"]),
            inner,
        )
            .prop_map(|(l, op, r)| format!("({} {} {})", l, op, r))
    })
}

fn sample_context() -> ContextMap {
    [("x", Value::from(7.0)), ("y", Value::Null)]
        .into_iter()
        .collect()
}

proptest! {
    #[test]
    fn test_number_literals_decode((text, expected) in decimal_literal()) {
        prop_assert_eq!(
            evaluate_expression(&text, &ContextMap::new()).unwrap(),
            Value::Number(expected)
        );
        prop_assert_eq!(
            evaluate_expression(&format!("-{}", text), &ContextMap::new()).unwrap(),
            Value::Number(-expected)
        );
    }

    #[test]
    fn test_string_literals_decode(s in "[a-zA-Z0-9 _.,:;-]{0,24}") {
        prop_assert_eq!(
            evaluate_expression(&format!("\"{}\"", s), &ContextMap::new()).unwrap(),
            Value::String(s)
        );
    }

    #[test]
    fn test_evaluation_is_deterministic(text in arithmetic()) {
        let expression = parse_expression(&text).unwrap();
        let evaluator = Evaluator::new();
        let ctx = sample_context();
        prop_assert_eq!(evaluator.evaluate(&expression, &ctx), evaluator.evaluate(&expression, &ctx));
    }

    #[test]
    fn test_cache_is_transparent(text in arithmetic()) {
        let cached = DecisionEngine::new();
        let uncached = DecisionEngine::with_config(EngineConfig::uncached());
        let ctx = sample_context();
        let cold = cached.evaluate_expression(&text, &ctx);
        let warm = cached.evaluate_expression(&text, &ctx);
        let fresh = uncached.evaluate_expression(&text, &ctx);
        prop_assert_eq!(&cold, &warm);
        prop_assert_eq!(&cold, &fresh);
    }
}

#[test]
fn test_keyword_literals_decode() {
    let empty = ContextMap::new();
    assert_eq!(evaluate_expression("true", &empty).unwrap(), Value::Boolean(true));
    assert_eq!(evaluate_expression("false", &empty).unwrap(), Value::Boolean(false));
    assert_eq!(evaluate_expression("null", &empty).unwrap(), Value::Null);
}
