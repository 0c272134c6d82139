//! # Core Parser Definitions
//!
//! The parser interface and the error type shared by every combinator. Positions are token
//! indices into the preprocessed token slice; [`crate::parser`] maps them back onto the
//! source text.

use thiserror::Error;

/// All parsers take an input slice and a start position and return the position after the
/// consumed input together with the parsed value.
pub trait Parser<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O>;
}

pub type ParseResult<O> = Result<(usize, O), ParseError>;

impl<I, O, P: Parser<I, O> + ?Sized> Parser<I, O> for Box<P> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        (**self).parse(input, pos)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected end of input, expected {expected} (context: {context:?})")]
    UnexpectedEOF {
        expected: String,
        position: usize,
        context: Option<String>,
    },
    #[error("expected {expected}, found {found} at token {position} (context: {context:?})")]
    Unexpected {
        expected: String,
        found: String,
        position: usize,
        context: Option<String>,
    },
    #[error("no alternative matched at token {position} (context: {context:?})")]
    NoAlternative {
        position: usize,
        context: Option<String>,
    },
    #[error("{message} at token {position} (context: {context:?})")]
    Failure {
        message: String,
        position: usize,
        context: Option<String>,
    },
}

impl ParseError {
    /// Labels the error with the grammar rule it happened in. The innermost label wins.
    pub fn with_context(mut self, ctx: &str) -> Self {
        let slot = match &mut self {
            ParseError::UnexpectedEOF { context, .. }
            | ParseError::Unexpected { context, .. }
            | ParseError::NoAlternative { context, .. }
            | ParseError::Failure { context, .. } => context,
        };
        if slot.is_none() {
            *slot = Some(ctx.to_string());
        }
        self
    }

    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedEOF { position, .. }
            | ParseError::Unexpected { position, .. }
            | ParseError::NoAlternative { position, .. }
            | ParseError::Failure { position, .. } => *position,
        }
    }

    pub fn context(&self) -> Option<&str> {
        match self {
            ParseError::UnexpectedEOF { context, .. }
            | ParseError::Unexpected { context, .. }
            | ParseError::NoAlternative { context, .. }
            | ParseError::Failure { context, .. } => context.as_deref(),
        }
    }

    /// Of two failed alternatives, the one that got further into the input explains the
    /// failure better. Ties keep `self`.
    pub fn furthest(self, other: ParseError) -> ParseError {
        if other.position() > self.position() {
            other
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_innermost_context_is_kept() {
        let err = ParseError::NoAlternative {
            position: 3,
            context: None,
        }
        .with_context("primary")
        .with_context("expression");
        assert_eq!(err.context(), Some("primary"));
        assert_eq!(err.position(), 3);
    }

    #[test]
    fn test_furthest_error_wins() {
        let near = ParseError::Failure {
            message: "near".to_string(),
            position: 1,
            context: None,
        };
        let far = ParseError::Failure {
            message: "far".to_string(),
            position: 4,
            context: None,
        };
        assert_eq!(near.clone().furthest(far.clone()), far);
        assert_eq!(far.clone().furthest(near), far);
    }
}
