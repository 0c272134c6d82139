use std::sync::Arc;

use handan::{
    Arity, ContextMap, DecisionEngine, EngineConfig, Error, EvalError, FunctionDef,
    FunctionRegistry, RegistryError, Value,
};
use pretty_assertions::assert_eq;

fn eval(text: &str) -> Value {
    handan::evaluate_expression(text, &ContextMap::new()).unwrap()
}

#[test]
fn test_builtin_categories() {
    assert_eq!(eval("upper_case(substring(\"decision\", 1, 3))"), Value::from("DEC"));
    assert_eq!(eval("string_length(\"table\")"), Value::from(5.0));
    assert_eq!(eval("decimal(1.125, 2)"), Value::from(1.12));
    assert_eq!(eval("sum([1, 2, 3]) / count([1, 2, 3])"), Value::from(2.0));
    assert_eq!(eval("median([5, 1, 3])"), Value::from(3.0));
    assert_eq!(eval("all([true, true])"), Value::Boolean(true));
    assert_eq!(eval("any([false, null])"), Value::Null);
    assert_eq!(eval("day_of_week(date(\"2024-01-15\"))"), Value::from("Monday"));
}

#[test]
fn test_unknown_function_and_arity() {
    let empty = ContextMap::new();
    assert!(matches!(
        handan::evaluate_expression("no_such_fn(1)", &empty),
        Err(Error::Eval(EvalError::UnknownFunction(name))) if name == "no_such_fn"
    ));
    assert!(matches!(
        handan::evaluate_expression("abs(1, 2)", &empty),
        Err(Error::Eval(EvalError::ArityMismatch { actual: 2, .. }))
    ));
}

#[test]
fn test_caller_registered_function() {
    let registry = FunctionRegistry::with_builtins();
    registry
        .register(FunctionDef::new("double", Arity::Exact(1), |args| {
            Ok(Value::from(args[0].as_number().unwrap_or_default() * 2.0))
        }))
        .unwrap();
    assert!(matches!(
        registry.register(FunctionDef::new("abs", Arity::Exact(1), |_| Ok(Value::Null))),
        Err(RegistryError::Duplicate(_))
    ));

    let engine = DecisionEngine::with_functions(EngineConfig::default(), Arc::new(registry));
    assert_eq!(
        engine
            .evaluate_expression("double(21)", &ContextMap::new())
            .unwrap(),
        Value::from(42.0)
    );
}
