use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag},
    character::complete::{char, digit1},
    combinator::{map, map_res, opt, recognize, value},
    error::context,
    sequence::{delimited, pair, preceded},
};

use super::token::{ParserResult, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Number(n) => write!(f, "{}", n),
        }
    }
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_string_content(input: &str) -> ParserResult<String> {
    context(
        "string content",
        map(
            opt(escaped_transform(
                is_not("\\\""),
                '\\',
                alt((
                    value("\\", tag("\\")),
                    value("\"", tag("\"")),
                    value("\n", tag("n")),
                    value("\t", tag("t")),
                    value("\r", tag("r")),
                )),
            )),
            Option::unwrap_or_default,
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_string_literal(input: &str) -> ParserResult<Literal> {
    context(
        "string literal",
        map(
            delimited(char('"'), parse_string_content, char('"')),
            Literal::String,
        ),
    )(input)
}

/// Numbers never carry a sign; `-` is always an operator token.
#[tracing::instrument(level = "debug", skip(input))]
fn parse_number_literal(input: &str) -> ParserResult<Literal> {
    context(
        "number literal",
        map_res(
            recognize(pair(digit1, opt(preceded(char('.'), digit1)))),
            |s: &str| s.parse::<f64>().map(Literal::Number),
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_literal(input: &str) -> ParserResult<Token> {
    context(
        "literal",
        map(
            alt((parse_string_literal, parse_number_literal)),
            Token::Literal,
        ),
    )(input)
}
