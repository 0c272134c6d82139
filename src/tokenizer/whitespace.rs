//! # Whitespace Token Handling
//!
//! Whitespace is kept as tokens so that every token span maps back onto the exact source
//! text; the [`preprocessor`](crate::preprocessor) drops it before parsing.
//!
//! * [`Token::Whitespace`]: runs of non-newline whitespace (spaces, tabs, no-break spaces
//!   pasted in from spreadsheets)
//! * [`Token::Newline`]: `\n` or `\r\n`

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    combinator::map,
    error::context,
};

use super::token::{ParserResult, Token};

fn is_inline_space(c: char) -> bool {
    c.is_whitespace() && c != '\n' && c != '\r'
}

/// ```
/// # use handan::tokenizer::whitespace::parse_whitespace;
/// # use handan::tokenizer::token::Token;
/// let (rest, token) = parse_whitespace(" \t>= 18").unwrap();
/// assert_eq!(token, Token::Whitespace(" \t".to_string()));
/// assert_eq!(rest, ">= 18");
/// ```
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_whitespace(input: &str) -> ParserResult<Token> {
    context(
        "whitespace",
        map(take_while1(is_inline_space), |ws: &str| {
            Token::Whitespace(ws.to_string())
        }),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_newline(input: &str) -> ParserResult<Token> {
    context(
        "newline",
        map(alt((tag("\r\n"), tag("\n"))), |_| Token::Newline),
    )(input)
}
