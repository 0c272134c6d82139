//! # Symbol Token Handling
//!
//! Operators and delimiters of the expression language.
//!
//! Symbols are parsed longest-match first so that `<=`, `**` and `..` are never split into
//! their one-character prefixes. Precedence is the parser's business, not the tokenizer's.

use strum_macros::{AsRefStr, Display, EnumString};

use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{map, value},
    error::context,
};

use super::token::{ParserResult, Token};

/// Represents operators in the expression language.
#[derive(Debug, Clone, PartialEq, EnumString, Display, AsRefStr)]
pub enum Operator {
    /// Member access operator (`.`)
    #[strum(serialize = ".")]
    Dot,
    /// Interval separator (`..`)
    #[strum(serialize = "..")]
    Range,

    /// Equality comparison operator (`=`)
    #[strum(serialize = "=")]
    Equal,
    /// Inequality comparison operator (`!=`)
    #[strum(serialize = "!=")]
    NotEqual,
    /// Greater than comparison operator (`>`)
    #[strum(serialize = ">")]
    Greater,
    /// Greater than or equal comparison operator (`>=`)
    #[strum(serialize = ">=")]
    GreaterEqual,
    /// Less than comparison operator (`<`)
    #[strum(serialize = "<")]
    Less,
    /// Less than or equal comparison operator (`<=`)
    #[strum(serialize = "<=")]
    LessEqual,

    /// Addition operator (`+`)
    #[strum(serialize = "+")]
    Plus,
    /// Subtraction / negation operator (`-`)
    #[strum(serialize = "-")]
    Minus,
    /// Multiplication operator (`*`)
    #[strum(serialize = "*")]
    Multiply,
    /// Division operator (`/`)
    #[strum(serialize = "/")]
    Divide,
    /// Remainder operator (`%`)
    #[strum(serialize = "%")]
    Modulo,
    /// Exponent operator (`**`)
    #[strum(serialize = "**")]
    Power,
}

// strum rejects a lone `}` in attribute strings
const CLOSE_BRACE: &str = "}";

/// Represents delimiters in the expression language.
#[derive(Debug, Clone, PartialEq, EnumString, AsRefStr)]
pub enum Delimiter {
    /// Opening brace (`{`) for context literals
    #[strum(serialize = "{")]
    OpenBrace,
    /// Closing brace (`}`) for context literals
    #[strum(serialize = "CLOSE_BRACE")]
    CloseBrace,
    /// Opening parenthesis (`(`) for grouping, calls and open interval starts
    #[strum(serialize = "(")]
    OpenParen,
    /// Closing parenthesis (`)`) for grouping, calls and open interval ends
    #[strum(serialize = ")")]
    CloseParen,
    /// Opening bracket (`[`) for lists, filters and closed interval starts
    #[strum(serialize = "[")]
    OpenBracket,
    /// Closing bracket (`]`) for lists, filters and closed interval ends
    #[strum(serialize = "]")]
    CloseBracket,
    /// Comma (`,`) for separating elements in lists
    #[strum(serialize = ",")]
    Comma,
    /// Colon (`:`) for key-value pairs
    #[strum(serialize = ":")]
    Colon,
}

impl std::fmt::Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delimiter::CloseBrace => f.write_str(CLOSE_BRACE),
            other => f.write_str(other.as_ref()),
        }
    }
}

/// Parses an operator token from the input string.
///
/// ```
/// # use handan::tokenizer::symbol::{parse_operator, Operator};
/// # use handan::tokenizer::token::Token;
/// let (rest, token) = parse_operator("** 2").unwrap();
/// assert_eq!(token, Token::Operator(Operator::Power));
/// assert_eq!(rest, " 2");
/// ```
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_operator(input: &str) -> ParserResult<Token> {
    context(
        "operator",
        map(
            alt((
                // Multi-character operators (matched first for longest-match)
                value(Operator::Range, tag("..")),
                value(Operator::NotEqual, tag("!=")),
                value(Operator::GreaterEqual, tag(">=")),
                value(Operator::LessEqual, tag("<=")),
                value(Operator::Power, tag("**")),
                // Single-character operators
                value(Operator::Dot, tag(".")),
                value(Operator::Equal, tag("=")),
                value(Operator::Greater, tag(">")),
                value(Operator::Less, tag("<")),
                value(Operator::Plus, tag("+")),
                value(Operator::Minus, tag("-")),
                value(Operator::Multiply, tag("*")),
                value(Operator::Divide, tag("/")),
                value(Operator::Modulo, tag("%")),
            )),
            Token::Operator,
        ),
    )(input)
}

/// Parses a delimiter token from the input string.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_delimiter(input: &str) -> ParserResult<Token> {
    context(
        "delimiter",
        map(
            alt((
                value(Delimiter::OpenBrace, tag("{")),
                value(Delimiter::CloseBrace, tag(CLOSE_BRACE)),
                value(Delimiter::OpenParen, tag("(")),
                value(Delimiter::CloseParen, tag(")")),
                value(Delimiter::OpenBracket, tag("[")),
                value(Delimiter::CloseBracket, tag("]")),
                value(Delimiter::Comma, tag(",")),
                value(Delimiter::Colon, tag(":")),
            )),
            Token::Delimiter,
        ),
    )(input)
}
