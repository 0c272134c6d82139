use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use super::hit_policy::{self, Match};
use super::model::{Column, DecisionTable, Rule};
use super::result::{ColumnTrace, DecisionError, DecisionResult, RuleTrace};
use crate::ast::Expression;
use crate::cache::{CacheStats, ExpressionCache, ResultCache};
use crate::config::EngineConfig;
use crate::eval::{ContextMap, Evaluator, FunctionRegistry, Value};
use crate::InternalResult;

const WILDCARD: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineCacheStats {
    pub ast: CacheStats,
    pub result: CacheStats,
}

/// Evaluates decision tables and standalone expressions.
///
/// Holds the evaluator and both caches; everything else is per call. Safe to share between
/// threads.
pub struct DecisionEngine {
    evaluator: Evaluator,
    ast_cache: ExpressionCache,
    result_cache: ResultCache,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_functions(config, Arc::new(FunctionRegistry::with_builtins()))
    }

    pub fn with_functions(config: EngineConfig, functions: Arc<FunctionRegistry>) -> Self {
        Self {
            evaluator: Evaluator::with_functions(functions),
            ast_cache: ExpressionCache::new(&config.ast_cache),
            result_cache: ResultCache::new(&config.result_cache),
        }
    }

    pub fn functions(&self) -> &Arc<FunctionRegistry> {
        self.evaluator.functions()
    }

    /// Parses and evaluates `text` against `context`.
    pub fn evaluate_expression(&self, text: &str, context: &ContextMap) -> InternalResult<Value> {
        let expression = self.ast_cache.expression(text)?;
        Ok(self.evaluator.evaluate(&expression, context)?)
    }

    #[instrument(level = "debug", skip(self, table, context), fields(decision = table.id()))]
    pub fn evaluate(
        &self,
        table: &DecisionTable,
        context: &ContextMap,
    ) -> Result<DecisionResult, DecisionError> {
        if let Some(result) = self.result_cache.get(table, context) {
            return Ok(result);
        }

        let policy = table.hit_policy();
        let observed: Vec<Result<Value, String>> = table
            .inputs()
            .iter()
            .map(|input| self.observe(input, context))
            .collect();

        let mut trace = Vec::new();
        let mut matched: Vec<&Rule> = Vec::new();
        for rule in table.rules() {
            let rule_trace = self.match_rule(table.inputs(), rule, &observed, context);
            let is_match = rule_trace.matched;
            trace.push(rule_trace);
            if is_match {
                matched.push(rule);
                if policy.stops_at_first_match() {
                    break;
                }
            }
        }
        debug!(
            matched = matched.len(),
            evaluated = trace.len(),
            "rules evaluated"
        );

        let matched_ids: Vec<&str> = matched.iter().map(|rule| rule.id.as_str()).collect();
        hit_policy::check_count(policy, &matched_ids)?;
        let matches = matched
            .iter()
            .map(|rule| {
                Ok(Match {
                    rule_id: rule.id.clone(),
                    output: self.rule_output(table.outputs(), rule, context)?,
                })
            })
            .collect::<Result<Vec<_>, DecisionError>>()?;
        let resolution = hit_policy::resolve(policy, matches)?;

        let result = DecisionResult {
            decision_id: table.id().to_string(),
            hit_policy: policy,
            output: resolution.output,
            matched_rules: resolution.matched_rules,
            collect: resolution.collect,
            trace,
        };
        self.result_cache.insert(table, context, &result);
        Ok(result)
    }

    /// Value an input column observes; failures are kept as messages for the trace.
    fn observe(&self, input: &Column, context: &ContextMap) -> Result<Value, String> {
        let source = if input.expression.trim().is_empty() {
            input.id.as_str()
        } else {
            input.expression.as_str()
        };
        let expression = self.ast_cache.expression(source).map_err(|e| e.to_string())?;
        self.evaluator
            .evaluate(&expression, context)
            .map_err(|e| e.to_string())
    }

    fn match_rule(
        &self,
        inputs: &[Column],
        rule: &Rule,
        observed: &[Result<Value, String>],
        context: &ContextMap,
    ) -> RuleTrace {
        let mut columns = Vec::with_capacity(inputs.len());
        let mut matched = true;
        for ((input, entry), observed) in inputs.iter().zip(&rule.inputs).zip(observed) {
            // later columns are still traced after a failure
            let column = self.match_cell(input, entry, observed, context);
            matched &= column.matched;
            columns.push(column);
        }
        RuleTrace {
            rule_id: rule.id.clone(),
            matched,
            columns,
        }
    }

    fn match_cell(
        &self,
        input: &Column,
        entry: &str,
        observed: &Result<Value, String>,
        context: &ContextMap,
    ) -> ColumnTrace {
        let mut column = ColumnTrace {
            input_id: input.id.clone(),
            entry: entry.to_string(),
            observed: observed.clone().unwrap_or_default(),
            matched: false,
            error: None,
        };
        let cell = entry.trim();
        if cell.is_empty() || cell == WILDCARD {
            column.matched = true;
            return column;
        }
        let outcome = observed.clone().and_then(|value| {
            let tests = self.ast_cache.unary_tests(cell).map_err(|e| e.to_string())?;
            self.evaluator
                .matches(&tests, &value, &[input.id.as_str(), input.label.as_str()], context)
                .map_err(|e| e.to_string())
        });
        match outcome {
            Ok(matched) => column.matched = matched,
            Err(message) => {
                debug!(input = %input.id, entry = cell, error = %message, "cell treated as no match");
                column.error = Some(message);
            }
        }
        column
    }

    /// Output of a selected rule: a single value, or a context keyed by column name when the
    /// table has several outputs.
    fn rule_output(
        &self,
        outputs: &[Column],
        rule: &Rule,
        context: &ContextMap,
    ) -> Result<Value, DecisionError> {
        let mut values = ContextMap::new();
        for (column, entry) in outputs.iter().zip(&rule.outputs) {
            let value = self
                .output_cell(column, entry, context)
                .map_err(|message| DecisionError::Output {
                    rule: rule.id.clone(),
                    output: column.id.clone(),
                    message,
                })?;
            if outputs.len() == 1 {
                return Ok(value);
            }
            values.insert(column.name(), value);
        }
        Ok(Value::Context(values))
    }

    fn output_cell(&self, column: &Column, entry: &str, context: &ContextMap) -> Result<Value, String> {
        let text = match entry.trim() {
            "" => column.expression.trim(),
            text => text,
        };
        if text.is_empty() {
            return Ok(Value::Null);
        }
        let expression = match self.ast_cache.expression(text) {
            Ok(expression) => expression,
            Err(error) => {
                debug!(entry = text, %error, "output cell read as text");
                return Ok(Value::string(unquote(text)));
            }
        };
        let value = self
            .evaluator
            .evaluate(&expression, context)
            .map_err(|e| e.to_string())?;
        if value.is_null() && names_only_unresolved(&expression, context) {
            return Ok(Value::string(text));
        }
        Ok(value)
    }

    pub fn cache_stats(&self) -> EngineCacheStats {
        EngineCacheStats {
            ast: self.ast_cache.stats(),
            result: self.result_cache.stats(),
        }
    }

    pub fn clear_caches(&self) {
        self.ast_cache.clear();
        self.result_cache.clear();
    }
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(text)
}

/// True for free text such as `high-risk`: only operators over names the context lacks.
fn names_only_unresolved(expression: &Expression, context: &ContextMap) -> bool {
    let mut free_text = true;
    let mut names = 0;
    expression.visit(&mut |node| match node {
        Expression::Variable(path) => {
            let root = path.split('.').next().unwrap_or(path);
            names += 1;
            free_text &= path.as_str() != crate::eval::INPUT_VALUE
                && !context.contains_key(path)
                && !context.contains_key(root);
        }
        Expression::BinaryOp { .. } | Expression::UnaryOp { .. } => {}
        _ => free_text = false,
    });
    free_text && names > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{HitPolicy, HitPolicyViolation};
    use pretty_assertions::assert_eq;

    fn context(json: serde_json::Value) -> ContextMap {
        match Value::from(json) {
            Value::Context(map) => map,
            _ => unreachable!(),
        }
    }

    fn age_table(policy: HitPolicy, rules: Vec<Rule>) -> DecisionTable {
        DecisionTable::new(
            "age_check",
            policy,
            vec![Column::input("age")],
            vec![Column::output("result")],
            rules,
        )
        .unwrap()
    }

    #[test]
    fn test_first_stops_at_first_match() {
        let table = age_table(
            HitPolicy::First,
            vec![
                Rule::new("r1", ["< 18"], ["reject"]),
                Rule::new("r2", [">= 18"], ["approve"]),
                Rule::new("r3", ["-"], ["fallback"]),
            ],
        );
        let result = DecisionEngine::new()
            .evaluate(&table, &context(serde_json::json!({"age": 25})))
            .unwrap();
        assert_eq!(result.output, Some(Value::from("approve")));
        assert_eq!(result.matched_rules, vec!["r2"]);
        assert_eq!(result.trace.len(), 2);
        assert!(!result.trace[0].matched);
    }

    #[test]
    fn test_broken_cell_is_no_match() {
        let table = age_table(
            HitPolicy::First,
            vec![
                Rule::new("r1", ["< 18 +"], ["broken"]),
                Rule::new("r2", ["unknown_fn(1)"], ["broken"]),
                Rule::new("r3", ["-"], ["fallback"]),
            ],
        );
        let result = DecisionEngine::new()
            .evaluate(&table, &context(serde_json::json!({"age": 25})))
            .unwrap();
        assert_eq!(result.output, Some(Value::from("fallback")));
        assert!(result.trace[0].columns[0].error.is_some());
        assert!(result.trace[1].columns[0]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("unknown function")));
    }

    #[test]
    fn test_unique_none_matched() {
        let table = age_table(HitPolicy::Unique, vec![Rule::new("r1", ["< 18"], ["minor"])]);
        let err = DecisionEngine::new()
            .evaluate(&table, &context(serde_json::json!({"age": 30})))
            .unwrap_err();
        assert_eq!(err, DecisionError::HitPolicy(HitPolicyViolation::NoMatch));
    }

    #[test]
    fn test_multiple_outputs_build_a_context() {
        let table = DecisionTable::new(
            "pricing",
            HitPolicy::First,
            vec![Column::input("tier")],
            vec![
                Column::output("discount"),
                Column::new("label_out", "", "\"standard\""),
            ],
            vec![
                Rule::new("gold", ["\"gold\""], ["0.2", "\"premium\""]),
                Rule::new("other", ["-"], ["base_discount", ""]),
            ],
        )
        .unwrap();
        let engine = DecisionEngine::new();

        let gold = engine
            .evaluate(&table, &context(serde_json::json!({"tier": "gold"})))
            .unwrap();
        assert_eq!(
            gold.value(),
            Value::Context(
                [
                    ("discount", Value::from(0.2)),
                    ("label_out", Value::from("premium"))
                ]
                .into_iter()
                .collect()
            )
        );

        let other = engine
            .evaluate(
                &table,
                &context(serde_json::json!({"tier": "x", "base_discount": 0.05})),
            )
            .unwrap();
        assert_eq!(other.value().property("discount"), Value::from(0.05));
        assert_eq!(other.value().property("label_out"), Value::from("standard"));
    }

    #[test]
    fn test_output_error_is_reported() {
        let table = age_table(HitPolicy::First, vec![Rule::new("r1", ["-"], ["1 / 0"])]);
        let err = DecisionEngine::new()
            .evaluate(&table, &context(serde_json::json!({"age": 1})))
            .unwrap_err();
        assert!(matches!(err, DecisionError::Output { ref rule, .. } if rule == "r1"));
    }

    #[test]
    fn test_free_text_outputs() {
        let table = DecisionTable::new(
            "risk",
            HitPolicy::First,
            vec![Column::input("score")],
            vec![Column::output("risk")],
            vec![
                Rule::new("high", ["> 50"], ["high-risk"]),
                Rule::new("low", ["-"], ["manual review"]),
            ],
        )
        .unwrap();
        let engine = DecisionEngine::new();
        let high = engine
            .evaluate(&table, &context(serde_json::json!({"score": 80})))
            .unwrap();
        assert_eq!(high.value(), Value::from("high-risk"));
        let low = engine
            .evaluate(&table, &context(serde_json::json!({"score": 10})))
            .unwrap();
        assert_eq!(low.value(), Value::from("manual review"));
    }

    #[test]
    fn test_output_with_known_names_stays_an_expression() {
        let table = age_table(
            HitPolicy::First,
            vec![Rule::new("r1", ["-"], ["age - missing"]), Rule::new("r2", ["-"], ["x"])],
        );
        let result = DecisionEngine::new()
            .evaluate(&table, &context(serde_json::json!({"age": 30})))
            .unwrap();
        assert_eq!(result.output, Some(Value::Null));

        assert_eq!(unquote("\"half open"), "\"half open");
        assert_eq!(unquote("\"a\" \"b\""), "a\" \"b");
        let free = crate::parser::parse_expression("high-risk").unwrap();
        assert!(names_only_unresolved(&free, &ContextMap::new()));
        let arithmetic = crate::parser::parse_expression("x + 1").unwrap();
        assert!(!names_only_unresolved(&arithmetic, &ContextMap::new()));
    }

    #[test]
    fn test_input_expression_and_label_binding() {
        let table = DecisionTable::new(
            "adult",
            HitPolicy::Unique,
            vec![Column::new("in1", "Applicant Age", "applicant.age")],
            vec![Column::output("adult")],
            vec![
                Rule::new("r1", ["in1 >= 18"], ["true"]),
                Rule::new("r2", ["< 18"], ["false"]),
            ],
        )
        .unwrap();
        let result = DecisionEngine::new()
            .evaluate(
                &table,
                &context(serde_json::json!({"applicant": {"age": 20}})),
            )
            .unwrap();
        assert_eq!(result.output, Some(Value::Boolean(true)));
    }

    #[test]
    fn test_result_cache_hits() {
        let table = age_table(HitPolicy::First, vec![Rule::new("r1", ["-"], ["ok"])]);
        let engine = DecisionEngine::new();
        let ctx = context(serde_json::json!({"age": 1}));
        let cold = engine.evaluate(&table, &ctx).unwrap();
        let warm = engine.evaluate(&table, &ctx).unwrap();
        assert_eq!(cold, warm);
        assert_eq!(engine.cache_stats().result.hits, 1);
        engine.clear_caches();
        assert_eq!(engine.cache_stats().result.size, 0);
    }

    #[test]
    fn test_evaluate_expression() {
        let engine = DecisionEngine::new();
        let ctx = context(serde_json::json!({"items": [1, 2, 3]}));
        assert_eq!(
            engine.evaluate_expression("sum(items) * 2", &ctx).unwrap(),
            Value::from(12.0)
        );
        assert!(matches!(
            engine.evaluate_expression("sum(", &ctx),
            Err(crate::Error::Parse(_))
        ));
        assert!(matches!(
            engine.evaluate_expression("1 / 0", &ctx),
            Err(crate::Error::Eval(_))
        ));
    }
}
