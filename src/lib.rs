//! # Handan: Decision Table Engine
//!
//! Handan evaluates business rules written as decision tables whose cells hold a small
//! expression language: arithmetic, comparison, three-valued logic, ranges, lists, contexts,
//! dates and durations, iteration and a library of built-in functions.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Expression text → Tokenizer → Preprocessor → Analyzer → AST → Evaluator
//! ```
//!
//! ### Stage 1: Tokenization
//!
//! The [`tokenizer`] module turns raw text into position-tagged tokens.
//!
//! ### Stage 2: Preprocessing
//!
//! The [`preprocessor`] module drops whitespace and comments from the token stream.
//!
//! ### Stage 3: Parsing
//!
//! The [`analyzer`] module builds the [`ast`] with token-level parser combinators. Two grammars
//! are offered through [`parser`]: full expressions, and the unary tests used in rule input
//! cells.
//!
//! ### Stage 4: Evaluation
//!
//! The [`eval`] module walks the tree against a caller-supplied [`ContextMap`].
//!
//! ## Decision Tables
//!
//! The [`decision`] module holds the table model, the hit policies and the
//! [`DecisionEngine`], which owns the [`cache`]s configured through [`config`].
//!
//! ```
//! use handan::{evaluate_expression, ContextMap, Value};
//!
//! let context: ContextMap = [("price", Value::from(40.0))].into_iter().collect();
//! let total = evaluate_expression("price * 1.5", &context).unwrap();
//! assert_eq!(total, Value::from(60.0));
//! ```

pub mod analyzer;
pub mod ast;
pub mod cache;
pub mod config;
pub mod decision;
pub mod error;
pub mod eval;
pub mod parser;
pub mod preprocessor;
pub mod tokenizer;

// Re-exports
pub use ast::*;
pub use config::{CacheConfig, EngineConfig};
pub use decision::{
    Column, DecisionEngine, DecisionError, DecisionResult, DecisionTable, HitPolicy,
    HitPolicyViolation, Rule,
};
pub use error::*;
pub use eval::*;
pub use parser::{parse_expression, parse_unary_tests, ParseError};

/// Parses and evaluates `text` in one step, without caching.
pub fn evaluate_expression(text: &str, context: &ContextMap) -> InternalResult<Value> {
    let expression = parse_expression(text)?;
    Ok(Evaluator::new().evaluate(&expression, context)?)
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    #[ctor::ctor]
    fn init_tests() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}
