//! # Decision Tables
//!
//! A [`DecisionTable`] holds input columns, output columns and rules. Every rule has one unary
//! test cell per input and one expression cell per output. [`DecisionEngine::evaluate`] runs a
//! table against a context:
//!
//! 1. each input column's expression is evaluated once to get its observed value
//! 2. every rule's input cells are tested against the observed values (`-` or an empty cell
//!    matches anything); a cell that fails to parse or evaluate counts as "no match"
//! 3. the [`HitPolicy`] selects among the matching rules and their outputs are evaluated
//!
//! The result carries a trace of every evaluated rule and column.
//!
//! ```
//! use handan::decision::{Column, DecisionEngine, DecisionTable, HitPolicy, Rule};
//! use handan::eval::{ContextMap, Value};
//!
//! let table = DecisionTable::new(
//!     "age_check",
//!     HitPolicy::First,
//!     vec![Column::input("age")],
//!     vec![Column::output("result")],
//!     vec![
//!         Rule::new("minor", ["< 18"], ["\"reject\""]),
//!         Rule::new("adult", [">= 18"], ["\"approve\""]),
//!     ],
//! )
//! .unwrap();
//!
//! let context: ContextMap = [("age", Value::from(25.0))].into_iter().collect();
//! let result = DecisionEngine::new().evaluate(&table, &context).unwrap();
//! assert_eq!(result.value(), Value::from("approve"));
//! ```

pub mod engine;
pub mod hit_policy;
pub mod model;
pub mod result;

pub use engine::{DecisionEngine, EngineCacheStats};
pub use model::{Column, DecisionTable, HitPolicy, ModelError, Rule};
pub use result::{
    CollectMetadata, ColumnTrace, DecisionError, DecisionResult, HitPolicyViolation, RuleTrace,
};
