//! # Parse pipeline
//!
//! ```text
//! text → Tokenizer → TokenPreprocessor → analyzer grammar → ast
//! ```
//!
//! Both entry points are pure functions of their input and may be called from any thread.
//! Errors from every stage are reported as a single [`ParseError`] carrying the offending
//! fragment of the original text and its position.

use thiserror::Error;
use tracing::debug;

use crate::analyzer::{
    self,
    parsers::{expression::parse_complete_expression, unary_tests::parse_unary_tests as unary_tests},
    Parser,
};
use crate::ast::{Expression, UnaryTests};
use crate::preprocessor::{Preprocessor, TokenPreprocessor};
use crate::tokenizer::token::{Token, TokenSpan, Tokenizer, TokenizerError};

const FRAGMENT_CHARS: usize = 20;

/// Malformed expression text.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} at line {line}, column {column} (near `{fragment}`)")]
pub struct ParseError {
    pub message: String,
    /// Source text starting at the failure, truncated.
    pub fragment: String,
    /// Byte offset into the source text.
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

impl From<TokenizerError> for ParseError {
    fn from(error: TokenizerError) -> Self {
        match error {
            TokenizerError::ParseError { found, span, .. } => ParseError {
                message: format!(
                    "unrecognized input `{}`",
                    found.chars().next().unwrap_or_default()
                ),
                fragment: found,
                position: span.start,
                line: span.line,
                column: span.column,
            },
        }
    }
}

impl ParseError {
    fn at(text: &str, position: usize, message: String) -> Self {
        let position = position.min(text.len());
        let (line, column) = line_column(text, position);
        ParseError {
            message,
            fragment: text[position..].chars().take(FRAGMENT_CHARS).collect(),
            position,
            line,
            column,
        }
    }

    fn from_analyzer(text: &str, spans: &[TokenSpan], error: analyzer::ParseError) -> Self {
        let position = spans
            .get(error.position())
            .map(|span| span.start)
            .unwrap_or(text.len());
        let message = match &error {
            analyzer::ParseError::Unexpected {
                expected, found, ..
            } => format!("expected {}, found `{}`", expected, found),
            analyzer::ParseError::UnexpectedEOF { expected, .. } => {
                format!("unexpected end of input, expected {}", expected)
            }
            analyzer::ParseError::NoAlternative { .. } => {
                return match spans.get(error.position()) {
                    Some(span) => {
                        ParseError::at(text, position, format!("unexpected `{}`", span.token))
                    }
                    None => ParseError::at(text, position, "unexpected end of input".to_string()),
                }
            }
            analyzer::ParseError::Failure { message, .. } => message.clone(),
        };
        let message = match error.context() {
            Some(context) => format!("{} in {}", message, context),
            None => message,
        };
        ParseError::at(text, position, message)
    }
}

fn line_column(text: &str, position: usize) -> (usize, usize) {
    text[..position]
        .chars()
        .fold((1, 1), |(line, column), c| match c {
            '\n' => (line + 1, 1),
            _ => (line, column + 1),
        })
}

fn run<O>(text: &str, parser: impl Parser<Token, O>) -> Result<O, ParseError> {
    let spans = Tokenizer::new().tokenize(text)?;
    let spans = TokenPreprocessor::default().process(spans);
    let (tokens, spans) = TokenPreprocessor::split(spans);
    if tokens.is_empty() {
        return Err(ParseError::at(text, 0, "empty expression".to_string()));
    }
    parser
        .parse(&tokens, 0)
        .map(|(_, output)| output)
        .map_err(|e| ParseError::from_analyzer(text, &spans, e))
}

/// Parses a complete expression.
///
/// ```
/// use handan::parser::parse_expression;
///
/// assert!(parse_expression("age >= 18 and country = \"JP\"").is_ok());
/// let err = parse_expression("1 + * 2").unwrap_err();
/// assert_eq!(err.position, 4);
/// ```
#[tracing::instrument(level = "debug")]
pub fn parse_expression(text: &str) -> Result<Expression, ParseError> {
    let expression = run(text, parse_complete_expression())?;
    debug!(?expression, "parsed expression");
    Ok(expression)
}

/// Parses a decision table input cell (`-`, `< 18`, `[1..10], 20`, `not("a", "b")`, ...).
#[tracing::instrument(level = "debug")]
pub fn parse_unary_tests(text: &str) -> Result<UnaryTests, ParseError> {
    let tests = run(text, unary_tests())?;
    debug!(?tests, "parsed unary tests");
    Ok(tests)
}
