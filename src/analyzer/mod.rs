//! # Analyzer
//!
//! Turns the preprocessed token stream into an [`ast::Expression`] using a parser combinator
//! library over token slices.
//!
//! * [`core`]: the [`Parser`] trait and [`ParseError`]
//! * [`combinators`]: composable building blocks
//! * [`prelude`]: constructor functions for the combinators
//! * [`parsers`]: the expression grammar and the rule-cell (unary test) grammar
//!
//! ```text
//! Expression text → Tokenizer → Preprocessor → Analyzer → AST
//! ```
//!
//! ```
//! use handan::analyzer::{parsers::expression::parse_expression, Parser};
//! use handan::tokenizer::{literal::Literal, symbol::Operator, token::Token};
//!
//! let tokens = vec![
//!     Token::Literal(Literal::Number(1.0)),
//!     Token::Operator(Operator::Plus),
//!     Token::Literal(Literal::Number(2.0)),
//! ];
//! let (pos, _ast) = parse_expression().parse(&tokens, 0).unwrap();
//! assert_eq!(pos, 3);
//! ```

pub mod combinators;
pub mod core;
pub mod parsers;
pub mod prelude;

pub use core::ParseError;
pub use core::ParseResult;
pub use core::Parser;

pub use crate::ast;
