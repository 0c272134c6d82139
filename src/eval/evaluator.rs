use std::sync::Arc;

use thiserror::Error;

use crate::ast::{Expression, UnaryTest, UnaryTests};

use super::{
    context::Scope,
    expression::ExpressionEvaluator,
    functions::FunctionRegistry,
    value::{ContextMap, Value},
};

pub use crate::tokenizer::token::INPUT_VALUE;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("function {name} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        name: String,
        expected: String,
        actual: usize,
    },
    #[error("invalid argument to {function}: {message}")]
    InvalidArgument { function: String, message: String },
    #[error("invalid {kind}: {text:?}")]
    InvalidTemporal { kind: &'static str, text: String },
    #[error("unknown type name: {0}")]
    UnknownType(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("value out of range: {0}")]
    Overflow(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    pub fn type_mismatch(operation: &str, left: &Value, right: &Value) -> Self {
        EvalError::TypeMismatch(format!(
            "{} {} {}",
            left.type_name(),
            operation,
            right.type_name()
        ))
    }

    pub fn invalid_argument(function: &str, message: impl Into<String>) -> Self {
        EvalError::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

/// Entry point for evaluating parsed expressions and rule cells.
///
/// Evaluation never mutates the caller's context and holds no state between calls, so one
/// `Evaluator` can be shared by any number of threads.
#[derive(Clone, Default)]
pub struct Evaluator {
    expression_evaluator: ExpressionEvaluator,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_functions(functions: Arc<FunctionRegistry>) -> Self {
        Self {
            expression_evaluator: ExpressionEvaluator::with_functions(functions),
        }
    }

    pub fn functions(&self) -> &Arc<FunctionRegistry> {
        self.expression_evaluator.functions()
    }

    pub fn evaluate(&self, expression: &Expression, context: &ContextMap) -> EvalResult<Value> {
        self.expression_evaluator
            .eval_expression(expression, &Scope::root(context))
    }

    /// Evaluates a rule input cell against the observed `input`.
    ///
    /// Inside the cell the input is bound to `?` and to every name in `input_names` (the
    /// column's id and label). Tests are alternatives: the cell matches when any test does.
    pub fn matches(
        &self,
        tests: &UnaryTests,
        input: &Value,
        input_names: &[&str],
        context: &ContextMap,
    ) -> EvalResult<bool> {
        let (negated, tests) = match tests {
            UnaryTests::Any => return Ok(true),
            UnaryTests::Tests { negated, tests } => (*negated, tests),
        };
        let mut bindings = ContextMap::new();
        bindings.insert(INPUT_VALUE, input.clone());
        for name in input_names.iter().filter(|name| !name.is_empty()) {
            bindings.insert(*name, input.clone());
        }
        let root = Scope::root(context);
        let scope = root.child(&bindings);

        let mut matched = false;
        for test in tests {
            if self.test_matches(test, input, input_names, &scope)? {
                matched = true;
                break;
            }
        }
        Ok(matched != negated)
    }

    fn test_matches(
        &self,
        test: &UnaryTest,
        input: &Value,
        input_names: &[&str],
        scope: &Scope,
    ) -> EvalResult<bool> {
        let evaluator = &self.expression_evaluator;
        match test {
            UnaryTest::Comparison { op, value } => {
                let value = evaluator.eval_expression(value, scope)?;
                Ok(evaluator.eval_binary_values(op, input, &value)? == Value::Boolean(true))
            }
            UnaryTest::Expression(expression) => {
                let is_predicate = std::iter::once(INPUT_VALUE)
                    .chain(input_names.iter().copied().filter(|name| !name.is_empty()))
                    .any(|name| expression.mentions_variable(name));
                let value = evaluator.eval_expression(expression, scope)?;
                if is_predicate {
                    return Ok(value == Value::Boolean(true));
                }
                Ok(match value {
                    Value::Range(range) => range.contains(input).unwrap_or(false),
                    Value::List(items) => items.iter().any(|item| match item {
                        Value::Range(range) => range.contains(input).unwrap_or(false),
                        other => other == input,
                    }),
                    other => other == *input,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_expression, parse_unary_tests};

    fn cell_matches(cell: &str, input: Value) -> bool {
        let tests = parse_unary_tests(cell).unwrap();
        Evaluator::new()
            .matches(&tests, &input, &["age", "Applicant Age"], &ContextMap::new())
            .unwrap()
    }

    #[test]
    fn test_evaluate_with_context() {
        let context: ContextMap = [("a", Value::from(2.0))].into_iter().collect();
        let expr = parse_expression("a * 3 + 1").unwrap();
        assert_eq!(
            Evaluator::new().evaluate(&expr, &context).unwrap(),
            Value::from(7.0)
        );
    }

    #[test]
    fn test_cell_forms() {
        assert!(cell_matches("-", Value::Null));
        assert!(cell_matches("< 18", Value::from(10.0)));
        assert!(!cell_matches("< 18", Value::from(18.0)));
        assert!(cell_matches("[18..65]", Value::from(65.0)));
        assert!(cell_matches("\"a\", \"b\"", Value::from("b")));
        assert!(!cell_matches("not(\"a\", \"b\")", Value::from("b")));
        assert!(cell_matches("not(\"a\", \"b\")", Value::from("c")));
        assert!(cell_matches("[1, 2, 3]", Value::from(2.0)));
        assert!(cell_matches("18", Value::from(18.0)));
    }

    #[test]
    fn test_predicate_cells() {
        assert!(cell_matches("? > 1 and ? < 5", Value::from(3.0)));
        assert!(cell_matches("age between 10 and 20", Value::from(15.0)));
        assert!(!cell_matches("? > 100", Value::from(3.0)));
    }

    #[test]
    fn test_null_input_does_not_match_comparison() {
        assert!(!cell_matches(">= 18", Value::Null));
        assert!(cell_matches("null", Value::Null));
    }

    #[test]
    fn test_cell_errors_surface() {
        let tests = parse_unary_tests("unknown_fn(1)").unwrap();
        let result = Evaluator::new().matches(&tests, &Value::Null, &[], &ContextMap::new());
        assert!(matches!(result, Err(EvalError::UnknownFunction(_))));
    }
}
