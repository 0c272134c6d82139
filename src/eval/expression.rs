use std::cmp::Ordering;
use std::sync::Arc;

use tracing::trace;

use super::context::Scope;
use super::evaluator::{EvalError, EvalResult};
use super::functions::{numeric::modulo, FunctionRegistry};
use super::temporal::{self, Duration};
use super::value::{ContextMap, Value};
use crate::ast::{BinaryOperator, Expression, Literal, Quantifier, UnaryOperator};

const TYPE_NAMES: [&str; 12] = [
    "number",
    "string",
    "boolean",
    "date",
    "time",
    "date_and_time",
    "duration",
    "list",
    "context",
    "range",
    "null",
    "any",
];

/// Tree walking interpreter over [`Expression`].
#[derive(Clone)]
pub struct ExpressionEvaluator {
    functions: Arc<FunctionRegistry>,
}

impl Default for ExpressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self::with_functions(Arc::new(FunctionRegistry::with_builtins()))
    }

    pub fn with_functions(functions: Arc<FunctionRegistry>) -> Self {
        Self { functions }
    }

    pub fn functions(&self) -> &Arc<FunctionRegistry> {
        &self.functions
    }

    pub fn eval_expression(&self, expr: &Expression, scope: &Scope) -> EvalResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(Self::eval_literal(lit)),
            Expression::Variable(path) => Ok(scope.resolve(path)),
            Expression::BinaryOp { op, left, right } => {
                self.eval_binary_op(op, left, right, scope)
            }
            Expression::UnaryOp { op, operand } => {
                let value = self.eval_expression(operand, scope)?;
                self.eval_unary_op(op, &value)
            }
            Expression::Range {
                lower,
                upper,
                lower_inclusive,
                upper_inclusive,
            } => Ok(Value::range(
                self.eval_expression(lower, scope)?,
                self.eval_expression(upper, scope)?,
                *lower_inclusive,
                *upper_inclusive,
            )),
            Expression::ListLiteral(items) => items
                .iter()
                .map(|item| self.eval_expression(item, scope))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::List),
            Expression::ContextLiteral(entries) => self.eval_context_literal(entries, scope),
            Expression::FunctionCall {
                function,
                arguments,
            } => self.eval_function_call(function, arguments, scope),
            Expression::PropertyAccess { base, key } => {
                Ok(self.eval_expression(base, scope)?.property(key))
            }
            Expression::If {
                condition,
                then_branch,
                else_branch,
            } => match self.eval_expression(condition, scope)? {
                Value::Boolean(true) => self.eval_expression(then_branch, scope),
                // false, null and any non-boolean take the else branch
                _ => self.eval_expression(else_branch, scope),
            },
            Expression::ForExpression {
                variable,
                source,
                body,
            } => self.eval_for(variable, source, body, scope),
            Expression::Quantified {
                quantifier,
                variable,
                source,
                predicate,
            } => self.eval_quantified(quantifier, variable, source, predicate, scope),
            Expression::Between {
                expression,
                lower,
                upper,
            } => {
                let value = self.eval_expression(expression, scope)?;
                let lower = self.eval_expression(lower, scope)?;
                let upper = self.eval_expression(upper, scope)?;
                let above = self.eval_greater_than_equal(&value, &lower)?;
                let below = self.eval_less_than_equal(&value, &upper)?;
                Ok(Self::and(&above, &below))
            }
            Expression::InstanceOf {
                expression,
                type_name,
            } => {
                let value = self.eval_expression(expression, scope)?;
                Self::eval_instance_of(&value, type_name)
            }
            Expression::Filter { base, filter } => self.eval_filter(base, filter, scope),
        }
    }

    fn eval_literal(lit: &Literal) -> Value {
        match lit {
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Null => Value::Null,
        }
    }

    fn eval_context_literal(
        &self,
        entries: &[(String, Expression)],
        scope: &Scope,
    ) -> EvalResult<Value> {
        let mut map = ContextMap::new();
        for (key, expr) in entries {
            let value = {
                let inner = scope.child(&map);
                self.eval_expression(expr, &inner)?
            };
            map.insert(key.clone(), value);
        }
        Ok(Value::Context(map))
    }

    fn eval_function_call(
        &self,
        function: &str,
        arguments: &[Expression],
        scope: &Scope,
    ) -> EvalResult<Value> {
        let args = arguments
            .iter()
            .map(|arg| self.eval_expression(arg, scope))
            .collect::<EvalResult<Vec<_>>>()?;
        trace!(function, ?args, "call");
        self.functions.call(function, &args)
    }

    /// Elements an iteration walks over, or `None` for a null source.
    fn iteration_items(value: Value) -> EvalResult<Option<Vec<Value>>> {
        Ok(match value {
            Value::Null => None,
            Value::List(items) => Some(items),
            Value::Range(range) => match range.integers()? {
                Some(items) => Some(items),
                None => Some(vec![Value::Range(range)]),
            },
            other => Some(vec![other]),
        })
    }

    fn eval_for(
        &self,
        variable: &str,
        source: &Expression,
        body: &Expression,
        scope: &Scope,
    ) -> EvalResult<Value> {
        let Some(items) = Self::iteration_items(self.eval_expression(source, scope)?)? else {
            return Ok(Value::Null);
        };
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let bindings: ContextMap = [(variable, item)].into_iter().collect();
            results.push(self.eval_expression(body, &scope.child(&bindings))?);
        }
        Ok(Value::List(results))
    }

    fn eval_quantified(
        &self,
        quantifier: &Quantifier,
        variable: &str,
        source: &Expression,
        predicate: &Expression,
        scope: &Scope,
    ) -> EvalResult<Value> {
        let Some(items) = Self::iteration_items(self.eval_expression(source, scope)?)? else {
            return Ok(Value::Null);
        };
        for item in items {
            let bindings: ContextMap = [(variable, item)].into_iter().collect();
            let holds =
                self.eval_expression(predicate, &scope.child(&bindings))? == Value::Boolean(true);
            match quantifier {
                Quantifier::Some if holds => return Ok(Value::Boolean(true)),
                Quantifier::Every if !holds => return Ok(Value::Boolean(false)),
                _ => {}
            }
        }
        Ok(Value::Boolean(matches!(quantifier, Quantifier::Every)))
    }

    fn eval_filter(&self, base: &Expression, filter: &Expression, scope: &Scope) -> EvalResult<Value> {
        let Some(items) = Self::iteration_items(self.eval_expression(base, scope)?)? else {
            return Ok(Value::Null);
        };

        // a filter that is a number on its own selects by position
        match self.eval_expression(filter, scope) {
            Ok(Value::Number(index)) => return Ok(Self::element_at(items, index)),
            Err(error) if !Self::binds_item_names(filter, &items) => return Err(error),
            _ => {}
        }

        let mut selected = Vec::new();
        for item in items {
            let mut bindings = ContextMap::new();
            bindings.insert("item", item.clone());
            if let Value::Context(map) = &item {
                for (key, value) in map.iter().filter(|(key, _)| *key != "item") {
                    bindings.insert(key.clone(), value.clone());
                }
            }
            if self.eval_expression(filter, &scope.child(&bindings))? == Value::Boolean(true) {
                selected.push(item);
            }
        }
        Ok(Value::List(selected))
    }

    /// Whether `filter` refers to `item` or to a key of a context element.
    fn binds_item_names(filter: &Expression, items: &[Value]) -> bool {
        filter.mentions_variable("item")
            || items.iter().any(|item| match item {
                Value::Context(map) => map.iter().any(|(key, _)| filter.mentions_variable(key)),
                _ => false,
            })
    }

    /// 1-based; negative positions count from the end.
    fn element_at(mut items: Vec<Value>, index: f64) -> Value {
        if index.fract() != 0.0 || index == 0.0 || index.abs() > items.len() as f64 {
            return Value::Null;
        }
        let position = if index > 0.0 {
            index as usize - 1
        } else {
            items.len() - index.abs() as usize
        };
        items.swap_remove(position)
    }

    fn eval_instance_of(value: &Value, type_name: &str) -> EvalResult<Value> {
        if !TYPE_NAMES.contains(&type_name) {
            return Err(EvalError::UnknownType(type_name.to_string()));
        }
        Ok(Value::Boolean(match type_name {
            "any" => !value.is_null(),
            name => value.type_name() == name,
        }))
    }

    fn eval_unary_op(&self, op: &UnaryOperator, value: &Value) -> EvalResult<Value> {
        match (op, value) {
            (_, Value::Null) => Ok(Value::Null),
            (UnaryOperator::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
            (UnaryOperator::Negate, Value::Duration(d)) => d
                .checked_negate()
                .map(Value::Duration)
                .ok_or_else(|| EvalError::Overflow(format!("-{}", d))),
            (UnaryOperator::Negate, other) => Err(EvalError::TypeMismatch(format!(
                "-{}",
                other.type_name()
            ))),
            (UnaryOperator::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
            (UnaryOperator::Not, _) => Ok(Value::Null),
        }
    }

    fn eval_binary_op(
        &self,
        op: &BinaryOperator,
        left: &Expression,
        right: &Expression,
        scope: &Scope,
    ) -> EvalResult<Value> {
        let left_val = self.eval_expression(left, scope)?;
        match (op, &left_val) {
            (BinaryOperator::And, Value::Boolean(false)) => return Ok(Value::Boolean(false)),
            (BinaryOperator::Or, Value::Boolean(true)) => return Ok(Value::Boolean(true)),
            _ => {}
        }
        let right_val = self.eval_expression(right, scope)?;
        self.eval_binary_values(op, &left_val, &right_val)
    }

    /// Applies a binary operator to two already evaluated operands.
    pub fn eval_binary_values(
        &self,
        op: &BinaryOperator,
        left: &Value,
        right: &Value,
    ) -> EvalResult<Value> {
        match op {
            BinaryOperator::Add => self.eval_add(left, right),
            BinaryOperator::Subtract => self.eval_subtract(left, right),
            BinaryOperator::Multiply => self.eval_multiply(left, right),
            BinaryOperator::Divide => self.eval_divide(left, right),
            BinaryOperator::Modulo => self.eval_modulo(left, right),
            BinaryOperator::Power => self.eval_power(left, right),
            BinaryOperator::Equal => self.eval_equal(left, right),
            BinaryOperator::NotEqual => self.eval_not_equal(left, right),
            BinaryOperator::LessThan => self.eval_less_than(left, right),
            BinaryOperator::GreaterThan => self.eval_greater_than(left, right),
            BinaryOperator::LessThanEqual => self.eval_less_than_equal(left, right),
            BinaryOperator::GreaterThanEqual => self.eval_greater_than_equal(left, right),
            BinaryOperator::And => Ok(Self::and(left, right)),
            BinaryOperator::Or => Ok(Self::or(left, right)),
            BinaryOperator::In => self.eval_in(left, right),
        }
    }

    fn eval_add(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        let overflow = || EvalError::Overflow(format!("{} + {}", left, right));
        match (left, right) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            (Value::String(l), Value::String(r)) => Ok(Value::String(format!("{}{}", l, r))),
            (Value::Duration(l), Value::Duration(r)) => {
                l.checked_add(r).map(Value::Duration).ok_or_else(overflow)
            }
            (Value::Date(d), Value::Duration(dur)) | (Value::Duration(dur), Value::Date(d)) => {
                temporal::add_to_date(*d, dur)
                    .map(Value::Date)
                    .ok_or_else(overflow)
            }
            (Value::DateTime(dt), Value::Duration(dur))
            | (Value::Duration(dur), Value::DateTime(dt)) => {
                temporal::add_to_date_time(*dt, dur)
                    .map(Value::DateTime)
                    .ok_or_else(overflow)
            }
            (Value::Time(t), Value::Duration(dur)) | (Value::Duration(dur), Value::Time(t)) => {
                temporal::add_to_time(*t, dur)
                    .map(Value::Time)
                    .ok_or_else(overflow)
            }
            _ => Err(EvalError::type_mismatch("+", left, right)),
        }
    }

    fn eval_subtract(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        match (left, right) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l - r)),
            (Value::Date(l), Value::Date(r)) => {
                Ok(Value::Duration(temporal::between_dates(*l, *r)))
            }
            (Value::DateTime(l), Value::DateTime(r)) => {
                Ok(Value::Duration(temporal::between_date_times(*l, *r)))
            }
            (Value::Time(l), Value::Time(r)) => {
                Ok(Value::Duration(temporal::between_times(*l, *r)))
            }
            (
                Value::Date(_) | Value::DateTime(_) | Value::Time(_) | Value::Duration(_),
                Value::Duration(dur),
            ) => {
                let negated = dur
                    .checked_negate()
                    .ok_or_else(|| EvalError::Overflow(format!("{} - {}", left, right)))?;
                self.eval_add(left, &Value::Duration(negated))
            }
            _ => Err(EvalError::type_mismatch("-", left, right)),
        }
    }

    fn eval_multiply(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        match (left, right) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l * r)),
            (Value::Duration(d), Value::Number(n)) | (Value::Number(n), Value::Duration(d)) => d
                .checked_scale(*n)
                .map(Value::Duration)
                .ok_or_else(|| EvalError::Overflow(format!("{} * {}", left, right))),
            _ => Err(EvalError::type_mismatch("*", left, right)),
        }
    }

    fn eval_divide(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        match (left, right) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Number(_) | Value::Duration(_), Value::Number(r)) if *r == 0.0 => {
                Err(EvalError::DivisionByZero)
            }
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l / r)),
            (Value::Duration(d), Value::Number(n)) => d
                .checked_scale(1.0 / n)
                .map(Value::Duration)
                .ok_or_else(|| EvalError::Overflow(format!("{} / {}", left, right))),
            (Value::Duration(l), Value::Duration(r)) if l.partial_cmp_duration(r).is_some() => {
                if r.magnitude() == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(Value::Number(l.magnitude() / r.magnitude()))
            }
            _ => Err(EvalError::type_mismatch("/", left, right)),
        }
    }

    fn eval_modulo(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        match (left, right) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Number(l), Value::Number(r)) => modulo(*l, *r).map(Value::Number),
            _ => Err(EvalError::type_mismatch("%", left, right)),
        }
    }

    fn eval_power(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        match (left, right) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l.powf(*r))),
            _ => Err(EvalError::type_mismatch("**", left, right)),
        }
    }

    fn eval_equal(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }
        Ok(Value::Boolean(left == right))
    }

    fn eval_not_equal(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }
        Ok(Value::Boolean(left != right))
    }

    fn eval_less_than(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        self.compare_values(left, right, |ordering| ordering.is_lt())
    }

    fn eval_greater_than(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        self.compare_values(left, right, |ordering| ordering.is_gt())
    }

    fn eval_less_than_equal(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        self.compare_values(left, right, |ordering| ordering.is_le())
    }

    fn eval_greater_than_equal(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        self.compare_values(left, right, |ordering| ordering.is_ge())
    }

    fn eval_in(&self, left: &Value, right: &Value) -> EvalResult<Value> {
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }
        Ok(Value::Boolean(match right {
            Value::Range(range) => range.contains(left).unwrap_or(false),
            Value::List(items) => items.iter().any(|item| match item {
                Value::Range(range) => range.contains(left).unwrap_or(false),
                other => other == left,
            }),
            other => other == left,
        }))
    }

    /// Three-valued conjunction; non-boolean operands count as unknown.
    fn and(left: &Value, right: &Value) -> Value {
        match (left.as_bool(), right.as_bool()) {
            (Some(false), _) | (_, Some(false)) => Value::Boolean(false),
            (Some(true), Some(true)) => Value::Boolean(true),
            _ => Value::Null,
        }
    }

    fn or(left: &Value, right: &Value) -> Value {
        match (left.as_bool(), right.as_bool()) {
            (Some(true), _) | (_, Some(true)) => Value::Boolean(true),
            (Some(false), Some(false)) => Value::Boolean(false),
            _ => Value::Null,
        }
    }

    // ヘルパーメソッド

    fn compare_values<F>(&self, left: &Value, right: &Value, compare: F) -> EvalResult<Value>
    where
        F: Fn(Ordering) -> bool,
    {
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }
        Ok(Value::Boolean(
            left.compare(right).map(compare).unwrap_or(false),
        ))
    }
}
