//! # Tokenizer Component
//!
//! Lexical analysis for the expression language. Raw expression text is turned into a
//! stream of [`TokenSpan`](token::TokenSpan) values that the [`analyzer`](crate::analyzer)
//! consumes after the [`preprocessor`](crate::preprocessor) has removed trivia.
//!
//! ## Component Structure
//!
//! * [`token`]: Core token types and the tokenizer driver
//! * [`keyword`]: Reserved words (`and`, `if`, `for`, `instance`, ...)
//! * [`symbol`]: Operators and delimiters
//! * [`literal`]: String and number literals
//! * [`whitespace`]: Whitespace and newline handling
//! * [`comment`]: `//` and `/* */` comments
//!
//! ## Position Tracking
//!
//! Every token records its byte offset, line and column so that a parse failure can point at
//! the offending fragment of the source text.
//!
//! ```rust
//! use handan::tokenizer::token::{Token, Tokenizer};
//!
//! let mut tokenizer = Tokenizer::new();
//! let tokens = tokenizer.tokenize("age >= 18").unwrap();
//! assert!(matches!(tokens[0].token, Token::Identifier(ref s) if s == "age"));
//! ```

pub mod comment;
pub mod keyword;
pub mod literal;
pub mod symbol;
pub mod token;
pub mod whitespace;
