//! Expression Evaluation System
//!
//! Turns a parsed [`Expression`](crate::ast::Expression) and a caller supplied context into a
//! [`Value`]. Evaluation is a single synchronous pass over the tree: no I/O, no shared mutable
//! state, and the caller's context is only ever read.
//!
//! # Core Components
//!
//! ## Evaluator
//! The facade used by the rest of the crate. Evaluates whole expressions and decision table
//! input cells (unary tests) against an observed input value.
//!
//! ## Expression Evaluator
//! The tree walking interpreter: operators, three-valued logic, ranges, iteration, filters and
//! function dispatch.
//!
//! ## Scope
//! Variable lookup. Dotted paths are tried as a single key first, then walked through nested
//! contexts. Bindings introduced by `for`, quantifiers, filters and context literals live in
//! child frames that never touch the caller's data.
//!
//! ## Value and Temporal
//! The runtime type system: numbers (`f64`), strings, booleans, null, dates, times,
//! date-times, durations, lists, contexts and ranges, with their comparison rules and the
//! ISO-8601 text formats.
//!
//! ## Functions
//! The built-in function library and the registry callers extend with their own functions.
//!
//! # Null and type rules
//!
//! - Arithmetic and comparison with a null operand yield null.
//! - Comparing values of different types yields `false`, never an error.
//! - `and`/`or` are three-valued and short-circuit.
//! - Unresolved variables are null.
//! - Wrong operand types for arithmetic, unknown functions, wrong arity and malformed temporal
//!   text are [`EvalError`]s.

pub mod context;
pub mod evaluator;
pub mod expression;
pub mod functions;
pub mod temporal;
pub mod value;

pub use context::Scope;
pub use evaluator::{EvalError, EvalResult, Evaluator, INPUT_VALUE};
pub use expression::ExpressionEvaluator;
pub use functions::{Arity, FunctionDef, FunctionRegistry, RegistryError};
pub use temporal::Duration;
pub use value::{ContextMap, RangeValue, Value};
