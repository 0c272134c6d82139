use handan::{evaluate_expression, parse_expression, ContextMap, Error, EvalError, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::context;

fn eval(text: &str) -> Value {
    evaluate_expression(text, &ContextMap::new()).unwrap()
}

fn eval_in(text: &str, ctx: serde_json::Value) -> Value {
    evaluate_expression(text, &context(ctx)).unwrap()
}

fn numbers(values: &[f64]) -> Value {
    Value::List(values.iter().copied().map(Value::from).collect())
}

#[test]
fn test_quantifiers_over_empty_lists() {
    assert_eq!(eval("some x in [] satisfies true"), Value::Boolean(false));
    assert_eq!(eval("every x in [] satisfies false"), Value::Boolean(true));
    assert_eq!(eval("some x in [1, 5, 9] satisfies x > 8"), Value::Boolean(true));
    assert_eq!(eval("every x in [1, 5, 9] satisfies x > 2"), Value::Boolean(false));
}

#[test]
fn test_range_membership() {
    assert_eq!(eval("5 in [1..10]"), Value::Boolean(true));
    assert_eq!(eval("10 in [1..10)"), Value::Boolean(false));
    assert_eq!(eval("1 in (1..10]"), Value::Boolean(false));
    assert_eq!(eval("10 in [1..10]"), Value::Boolean(true));
}

#[test]
fn test_three_valued_logic() {
    let t = Value::Boolean(true);
    let f = Value::Boolean(false);
    let n = Value::Null;
    let cases = [
        ("true and true", t.clone()),
        ("true and false", f.clone()),
        ("true and null", n.clone()),
        ("false and true", f.clone()),
        ("false and false", f.clone()),
        ("false and null", f.clone()),
        ("null and true", n.clone()),
        ("null and false", f.clone()),
        ("null and null", n.clone()),
        ("true or true", t.clone()),
        ("true or false", t.clone()),
        ("true or null", t.clone()),
        ("false or true", t.clone()),
        ("false or false", f.clone()),
        ("false or null", n.clone()),
        ("null or true", t.clone()),
        ("null or false", n.clone()),
        ("null or null", n),
    ];
    for (text, expected) in cases {
        assert_eq!(eval(text), expected, "{}", text);
    }
}

#[test]
fn test_null_propagation_and_cross_type_comparison() {
    assert_eq!(eval("missing + 1"), Value::Null);
    assert_eq!(eval("missing < 1"), Value::Null);
    assert_eq!(eval("1 = \"1\""), Value::Boolean(false));
    assert_eq!(eval("1 < \"2\""), Value::Boolean(false));
    assert_eq!(eval("true < false"), Value::Boolean(false));
}

#[test]
fn test_arithmetic_errors() {
    assert!(matches!(
        evaluate_expression("1 / 0", &ContextMap::new()),
        Err(Error::Eval(EvalError::DivisionByZero))
    ));
    assert!(matches!(
        evaluate_expression("1 + true", &ContextMap::new()),
        Err(Error::Eval(EvalError::TypeMismatch(_)))
    ));
    assert_eq!(eval("\"ab\" + \"cd\""), Value::from("abcd"));
    assert_eq!(eval("2 ** 10"), Value::from(1024.0));
    assert_eq!(eval("-7 % 3"), Value::from(2.0));
}

#[test]
fn test_variables_and_paths() {
    let ctx = json!({
        "applicant": {"age": 42, "name": "Ann"},
        "order.total": 99,
    });
    assert_eq!(eval_in("applicant.age + 1", ctx.clone()), Value::from(43.0));
    assert_eq!(eval_in("order.total", ctx.clone()), Value::from(99.0));
    assert_eq!(eval_in("applicant.missing", ctx), Value::Null);
}

#[test]
fn test_if_for_and_filters() {
    assert_eq!(eval_in("if x > 1 then \"big\" else \"small\"", json!({"x": 5})), Value::from("big"));
    assert_eq!(eval("if null then 1 else 2"), Value::from(2.0));
    assert_eq!(eval("for x in [1, 2, 3] return x * 2"), numbers(&[2.0, 4.0, 6.0]));
    assert_eq!(eval("for i in [1..3] return i"), numbers(&[1.0, 2.0, 3.0]));
    assert_eq!(eval("[1, 2, 3][item > 1]"), numbers(&[2.0, 3.0]));
    assert_eq!(eval("[1, 2, 3][-1]"), Value::from(3.0));
    assert_eq!(eval("[1, 2, 3][4]"), Value::Null);
    assert_eq!(
        eval_in(
            "orders[amount > 10]",
            json!({"orders": [{"amount": 5}, {"amount": 20}]})
        ),
        Value::List(vec![Value::from(json!({"amount": 20}))])
    );
}

#[test]
fn test_context_literals_and_instance_of() {
    assert_eq!(eval("{a: 1, b: a + 1}.b"), Value::from(2.0));
    assert_eq!(eval("5 instance of number"), Value::Boolean(true));
    assert_eq!(eval("\"x\" instance of number"), Value::Boolean(false));
    assert!(matches!(
        evaluate_expression("5 instance of widget", &ContextMap::new()),
        Err(Error::Eval(EvalError::UnknownType(_)))
    ));
}

#[test]
fn test_between_and_not() {
    assert_eq!(eval("5 between 1 and 10"), Value::Boolean(true));
    assert_eq!(eval("not 1 = 2"), Value::Boolean(true));
    assert_eq!(eval("not(true)"), Value::Boolean(false));
}

#[test]
fn test_temporal_values() {
    assert_eq!(
        eval("date(\"2024-01-31\") + duration(\"P1M\") = date(\"2024-02-29\")"),
        Value::Boolean(true)
    );
    assert_eq!(eval("date(\"2024-03-15\").month"), Value::from(3.0));
    assert_eq!(
        eval("date(\"2024-03-02\") - date(\"2024-03-01\") = duration(\"P1D\")"),
        Value::Boolean(true)
    );
    assert!(matches!(
        evaluate_expression("date(\"2024-13-01\")", &ContextMap::new()),
        Err(Error::Eval(EvalError::InvalidTemporal { .. }))
    ));
}

#[test]
fn test_parse_errors_point_at_the_input() {
    let err = parse_expression("a +\n  * 2").unwrap_err();
    assert_eq!(err.line, 2);
    assert!(!err.message.is_empty());

    assert!(parse_expression("\"unterminated").is_err());
    assert!(parse_expression("").is_err());
}

#[test]
fn test_caller_context_is_untouched() {
    let ctx = context(json!({"xs": [1, 2], "x": 100}));
    let before = ctx.clone();
    let result = evaluate_expression("for x in xs return x + 1", &ctx).unwrap();
    assert_eq!(result, numbers(&[2.0, 3.0]));
    assert_eq!(ctx, before);
}

#[test]
fn test_huge_ranges_fail_instead_of_allocating() {
    for text in [
        "for i in [-100000000000000000000..100000000000000000000] return i",
        "count(for i in [1..1000000000000000000] return i)",
        "some i in [1..1000000000000000000] satisfies i = 0",
    ] {
        assert!(
            matches!(
                evaluate_expression(text, &ContextMap::new()),
                Err(Error::Eval(EvalError::Overflow(_)))
            ),
            "{}",
            text
        );
    }
    assert_eq!(eval("count(for i in [1..1000] return i)"), Value::from(1000.0));
}

#[test]
fn test_duration_overflow_is_an_error() {
    for text in [
        "-(duration(\"P1D\") * -100000000000000000000)",
        "string(duration(\"P1D\") * -100000000000000000000)",
        "date(\"2024-01-01\") - duration(\"P1D\") * 100000000000000000000",
    ] {
        assert!(
            matches!(
                evaluate_expression(text, &ContextMap::new()),
                Err(Error::Eval(EvalError::Overflow(_)))
            ),
            "{}",
            text
        );
    }
}

#[test]
fn test_division_checks_types_before_zero() {
    assert!(matches!(
        evaluate_expression("\"a\" / 0", &ContextMap::new()),
        Err(Error::Eval(EvalError::TypeMismatch(_)))
    ));
}

#[test]
fn test_filter_errors_are_not_swallowed() {
    assert!(matches!(
        evaluate_expression("[][1 / 0]", &ContextMap::new()),
        Err(Error::Eval(EvalError::DivisionByZero))
    ));
    assert_eq!(eval_in("xs[item > 1]", json!({"xs": [1, 2]})), numbers(&[2.0]));
}
