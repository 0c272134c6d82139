//! # Token Preprocessor
//!
//! Sits between the [`tokenizer`](crate::tokenizer) and the [`analyzer`](crate::analyzer):
//!
//! ```text
//! Expression text → Tokenizer → Preprocessor → Analyzer → AST
//! ```
//!
//! Whitespace, newline and comment tokens are dropped. Spans are kept so that parse errors
//! can still be reported against the original text.

use crate::tokenizer::token::{Token, TokenSpan};

/// A trait for preprocessing different types of input
pub trait Preprocessor<T, U = T> {
    fn process(&self, input: T) -> U;
}

#[derive(Debug, Default, Clone)]
pub struct TokenPreprocessor {}

impl TokenPreprocessor {
    pub fn new() -> Self {
        Self {}
    }

    /// Splits significant spans into the bare tokens the analyzer consumes and the spans used
    /// for error positions.
    pub fn split(spans: Vec<TokenSpan>) -> (Vec<Token>, Vec<TokenSpan>) {
        let tokens = spans.iter().map(|span| span.token.clone()).collect();
        (tokens, spans)
    }
}

impl Preprocessor<Vec<TokenSpan>> for TokenPreprocessor {
    fn process(&self, input: Vec<TokenSpan>) -> Vec<TokenSpan> {
        input
            .into_iter()
            .filter(|span| !span.token.is_trivia())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{literal::Literal, symbol::Operator, token::Tokenizer};

    #[test]
    fn test_trivia_is_removed_and_spans_survive() {
        let spans = Tokenizer::new()
            .tokenize("a /* note */\n  + 1 // trailing")
            .unwrap();
        let processed = TokenPreprocessor::default().process(spans);
        let (tokens, spans) = TokenPreprocessor::split(processed);

        assert_eq!(
            tokens,
            vec![
                Token::Identifier("a".to_string()),
                Token::Operator(Operator::Plus),
                Token::Literal(Literal::Number(1.0)),
            ]
        );
        assert_eq!(spans[1].line, 2);
        assert_eq!(spans[1].column, 3);
    }
}
