use super::super::{core::*, prelude::*};
use crate::ast;
use crate::tokenizer::{
    keyword::Keyword,
    literal::Literal,
    symbol::{Delimiter, Operator},
    token::Token,
};

// 基本的なパーサー
pub fn parse_identifier() -> impl Parser<Token, String> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Identifier(s) => Some(s.clone()),
            _ => None,
        }),
        "identifier",
    )
}

pub fn parse_literal() -> impl Parser<Token, ast::Literal> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Literal(Literal::Number(n)) => Some(ast::Literal::Number(*n)),
            Token::Literal(Literal::String(s)) => Some(ast::Literal::String(s.clone())),
            Token::Keyword(Keyword::True) => Some(ast::Literal::Boolean(true)),
            Token::Keyword(Keyword::False) => Some(ast::Literal::Boolean(false)),
            Token::Keyword(Keyword::Null) => Some(ast::Literal::Null),
            _ => None,
        }),
        "literal",
    )
}

pub fn parse_string_literal() -> impl Parser<Token, String> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Literal(Literal::String(s)) => Some(s.clone()),
            _ => None,
        }),
        "string",
    )
}

pub fn parse_keyword(keyword: Keyword) -> impl Parser<Token, ()> {
    let label = format!("keyword {}", keyword);
    with_context(as_unit(equal(Token::Keyword(keyword))), label)
}

pub fn parse_operator(operator: Operator) -> impl Parser<Token, ()> {
    as_unit(equal(Token::Operator(operator)))
}

// 区切り文字パーサー
pub fn parse_delimiter(delimiter: Delimiter) -> impl Parser<Token, ()> {
    as_unit(equal(Token::Delimiter(delimiter)))
}

pub fn parse_comma() -> impl Parser<Token, ()> {
    parse_delimiter(Delimiter::Comma)
}

pub fn parse_colon() -> impl Parser<Token, ()> {
    parse_delimiter(Delimiter::Colon)
}

pub fn parse_open_paren() -> impl Parser<Token, ()> {
    parse_delimiter(Delimiter::OpenParen)
}

pub fn parse_close_paren() -> impl Parser<Token, ()> {
    parse_delimiter(Delimiter::CloseParen)
}

pub fn parse_open_bracket() -> impl Parser<Token, ()> {
    parse_delimiter(Delimiter::OpenBracket)
}

pub fn parse_close_bracket() -> impl Parser<Token, ()> {
    parse_delimiter(Delimiter::CloseBracket)
}

pub fn parse_open_brace() -> impl Parser<Token, ()> {
    parse_delimiter(Delimiter::OpenBrace)
}

pub fn parse_close_brace() -> impl Parser<Token, ()> {
    parse_delimiter(Delimiter::CloseBrace)
}

/// Comparison operators, shared by binary comparisons and unary-test prefixes.
pub fn parse_comparison_operator() -> impl Parser<Token, ast::BinaryOperator> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Operator(Operator::Equal) => Some(ast::BinaryOperator::Equal),
            Token::Operator(Operator::NotEqual) => Some(ast::BinaryOperator::NotEqual),
            Token::Operator(Operator::Less) => Some(ast::BinaryOperator::LessThan),
            Token::Operator(Operator::LessEqual) => Some(ast::BinaryOperator::LessThanEqual),
            Token::Operator(Operator::Greater) => Some(ast::BinaryOperator::GreaterThan),
            Token::Operator(Operator::GreaterEqual) => {
                Some(ast::BinaryOperator::GreaterThanEqual)
            }
            _ => None,
        }),
        "comparison operator",
    )
}
