//! Expression grammar, loosest binding first:
//!
//! | level | forms |
//! |---|---|
//! | disjunction | `a or b` |
//! | conjunction | `a and b` |
//! | negation | `not a` |
//! | comparison | `= != < > <= >=`, `between x and y`, `in`, `instance of` |
//! | additive | `+ -` |
//! | multiplicative | `* / %` |
//! | power | `**` (right-associative) |
//! | unary | `-a` |
//! | postfix | `a.key`, `a[filter]` |
//! | primary | literals, names, calls, `( )`, lists, ranges, contexts, `if`, `for`, `some`/`every` |

use super::{
    super::{core::*, prelude::*},
    common::*,
};
use crate::ast::{self, BinaryOperator, Expression};
use crate::tokenizer::{
    keyword::Keyword,
    symbol::{Delimiter, Operator},
    token::Token,
};

pub fn parse_expression() -> impl Parser<Token, Expression> {
    with_context(lazy(parse_disjunction), "expression")
}

/// An expression that spans the whole token stream.
pub fn parse_complete_expression() -> impl Parser<Token, Expression> {
    map(tuple2(parse_expression(), eof()), |(expr, _)| expr)
}

fn fold_binary((first, rest): (Expression, Vec<(BinaryOperator, Expression)>)) -> Expression {
    rest.into_iter()
        .fold(first, |left, (op, right)| Expression::binary(op, left, right))
}

fn parse_disjunction() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_conjunction(),
                many(tuple2(
                    map(parse_keyword(Keyword::Or), |_| BinaryOperator::Or),
                    parse_conjunction(),
                )),
            ),
            fold_binary,
        ),
        "logical or",
    )
}

fn parse_conjunction() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_negation(),
                many(tuple2(
                    map(parse_keyword(Keyword::And), |_| BinaryOperator::And),
                    parse_negation(),
                )),
            ),
            fold_binary,
        ),
        "logical and",
    )
}

fn parse_negation() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(map(
                preceded(parse_keyword(Keyword::Not), lazy(parse_negation)),
                Expression::not,
            )),
            Box::new(parse_comparison()),
        ]),
        "logical not",
    )
}

enum ComparisonSuffix {
    Binary(BinaryOperator, Expression),
    Between(Expression, Expression),
    InstanceOf(String),
}

fn parse_comparison() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(parse_additive(), optional(parse_comparison_suffix())),
            |(left, suffix)| match suffix {
                None => left,
                Some(ComparisonSuffix::Binary(op, right)) => Expression::binary(op, left, right),
                Some(ComparisonSuffix::Between(lower, upper)) => Expression::Between {
                    expression: Box::new(left),
                    lower: Box::new(lower),
                    upper: Box::new(upper),
                },
                Some(ComparisonSuffix::InstanceOf(type_name)) => Expression::InstanceOf {
                    expression: Box::new(left),
                    type_name,
                },
            },
        ),
        "comparison",
    )
}

fn parse_comparison_suffix() -> impl Parser<Token, ComparisonSuffix> {
    choice(vec![
        Box::new(map(
            tuple2(parse_comparison_operator(), lazy(parse_additive)),
            |(op, right)| ComparisonSuffix::Binary(op, right),
        )),
        Box::new(map(
            preceded(parse_keyword(Keyword::In), lazy(parse_additive)),
            |right| ComparisonSuffix::Binary(BinaryOperator::In, right),
        )),
        Box::new(map(
            tuple4(
                parse_keyword(Keyword::Between),
                lazy(parse_additive),
                parse_keyword(Keyword::And),
                lazy(parse_additive),
            ),
            |(_, lower, _, upper)| ComparisonSuffix::Between(lower, upper),
        )),
        Box::new(map(
            preceded(
                parse_keyword(Keyword::Instance),
                preceded(parse_keyword(Keyword::Of), parse_type_name()),
            ),
            ComparisonSuffix::InstanceOf,
        )),
    ])
}

fn parse_type_name() -> impl Parser<Token, String> {
    with_context(
        choice(vec![
            Box::new(parse_identifier()),
            Box::new(map(parse_keyword(Keyword::Null), |_| "null".to_string())),
        ]),
        "type name",
    )
}

fn parse_additive() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_multiplicative(),
                many(tuple2(parse_additive_operator(), parse_multiplicative())),
            ),
            fold_binary,
        ),
        "additive",
    )
}

fn parse_additive_operator() -> impl Parser<Token, BinaryOperator> {
    satisfy(|token: &Token| match token {
        Token::Operator(Operator::Plus) => Some(BinaryOperator::Add),
        Token::Operator(Operator::Minus) => Some(BinaryOperator::Subtract),
        _ => None,
    })
}

fn parse_multiplicative() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_power(),
                many(tuple2(parse_multiplicative_operator(), parse_power())),
            ),
            fold_binary,
        ),
        "multiplicative",
    )
}

fn parse_multiplicative_operator() -> impl Parser<Token, BinaryOperator> {
    satisfy(|token: &Token| match token {
        Token::Operator(Operator::Multiply) => Some(BinaryOperator::Multiply),
        Token::Operator(Operator::Divide) => Some(BinaryOperator::Divide),
        Token::Operator(Operator::Modulo) => Some(BinaryOperator::Modulo),
        _ => None,
    })
}

fn parse_power() -> impl Parser<Token, Expression> {
    let exponent: Box<dyn Parser<Token, Expression>> = Box::new(lazy(parse_power));
    with_context(
        map(
            tuple2(
                parse_unary(),
                optional(preceded(parse_operator(Operator::Power), exponent)),
            ),
            |(base, exponent)| match exponent {
                Some(exponent) => Expression::binary(BinaryOperator::Power, base, exponent),
                None => base,
            },
        ),
        "power",
    )
}

fn parse_unary() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(map(
                preceded(parse_operator(Operator::Minus), lazy(parse_unary)),
                Expression::negate,
            )),
            Box::new(parse_postfix()),
        ]),
        "unary",
    )
}

enum Postfix {
    Property(String),
    Filter(Expression),
}

fn parse_postfix() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_primary(),
                many(choice(vec![
                    Box::new(map(
                        preceded(parse_operator(Operator::Dot), parse_identifier()),
                        Postfix::Property,
                    )),
                    Box::new(map(
                        delimited(
                            parse_open_bracket(),
                            lazy(parse_expression),
                            parse_close_bracket(),
                        ),
                        Postfix::Filter,
                    )),
                ])),
            ),
            |(base, suffixes)| {
                suffixes
                    .into_iter()
                    .fold(base, |base, suffix| match suffix {
                        Postfix::Property(key) => Expression::property(base, key),
                        Postfix::Filter(filter) => Expression::Filter {
                            base: Box::new(base),
                            filter: Box::new(filter),
                        },
                    })
            },
        ),
        "postfix",
    )
}

fn parse_primary() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(map(parse_literal(), Expression::Literal)),
            Box::new(parse_if()),
            Box::new(parse_for()),
            Box::new(parse_quantified()),
            Box::new(parse_parenthesized()),
            Box::new(parse_bracketed()),
            Box::new(parse_left_open_range()),
            Box::new(parse_context_literal()),
            Box::new(parse_name_or_call()),
        ]),
        "primary",
    )
}

/// A name (including the implicit input `?`) or, when followed by `(`, a function call.
fn parse_name_or_call() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_identifier(),
                optional(with_context(
                    delimited(
                        parse_open_paren(),
                        separated_list(lazy(parse_expression), parse_comma()),
                        parse_close_paren(),
                    ),
                    "function call",
                )),
            ),
            |(name, arguments)| match arguments {
                Some(arguments) => Expression::FunctionCall {
                    function: name,
                    arguments,
                },
                None => Expression::Variable(name),
            },
        ),
        "name",
    )
}

fn parse_if() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple3(
                preceded(parse_keyword(Keyword::If), lazy(parse_expression)),
                preceded(parse_keyword(Keyword::Then), lazy(parse_expression)),
                preceded(parse_keyword(Keyword::Else), lazy(parse_expression)),
            ),
            |(condition, then_branch, else_branch)| Expression::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
        ),
        "if expression",
    )
}

fn parse_for() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple3(
                preceded(parse_keyword(Keyword::For), parse_identifier()),
                preceded(parse_keyword(Keyword::In), lazy(parse_expression)),
                preceded(parse_keyword(Keyword::Return), lazy(parse_expression)),
            ),
            |(variable, source, body)| Expression::ForExpression {
                variable,
                source: Box::new(source),
                body: Box::new(body),
            },
        ),
        "for expression",
    )
}

fn parse_quantifier() -> impl Parser<Token, ast::Quantifier> {
    satisfy(|token: &Token| match token {
        Token::Keyword(Keyword::Some) => Some(ast::Quantifier::Some),
        Token::Keyword(Keyword::Every) => Some(ast::Quantifier::Every),
        _ => None,
    })
}

fn parse_quantified() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple4(
                parse_quantifier(),
                parse_identifier(),
                preceded(parse_keyword(Keyword::In), lazy(parse_expression)),
                preceded(parse_keyword(Keyword::Satisfies), lazy(parse_expression)),
            ),
            |(quantifier, variable, source, predicate)| Expression::Quantified {
                quantifier,
                variable,
                source: Box::new(source),
                predicate: Box::new(predicate),
            },
        ),
        "quantified expression",
    )
}

/// Closing token of an interval: `]` includes the end, `)` excludes it.
fn parse_range_end() -> impl Parser<Token, bool> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Delimiter(Delimiter::CloseBracket) => Some(true),
            Token::Delimiter(Delimiter::CloseParen) => Some(false),
            _ => None,
        }),
        "interval end",
    )
}

/// `.. upper end`
fn parse_range_tail() -> impl Parser<Token, (Expression, bool)> {
    map(
        tuple3(
            parse_operator(Operator::Range),
            lazy(parse_expression),
            parse_range_end(),
        ),
        |(_, upper, upper_inclusive)| (upper, upper_inclusive),
    )
}

enum ParenTail {
    Range(Expression, bool),
    Close,
}

/// `( expr )` or `( lower .. upper ]`
fn parse_parenthesized() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                preceded(parse_open_paren(), lazy(parse_expression)),
                choice(vec![
                    Box::new(map(parse_range_tail(), |(upper, inclusive)| {
                        ParenTail::Range(upper, inclusive)
                    })),
                    Box::new(map(parse_close_paren(), |_| ParenTail::Close)),
                ]),
            ),
            |(inner, tail)| match tail {
                ParenTail::Range(upper, upper_inclusive) => {
                    Expression::range(inner, upper, false, upper_inclusive)
                }
                ParenTail::Close => inner,
            },
        ),
        "parenthesized expression",
    )
}

enum BracketTail {
    Range(Expression, bool),
    List(Vec<Expression>),
}

/// `[ ]`, `[ a, b ]` or `[ lower .. upper ]`
fn parse_bracketed() -> impl Parser<Token, Expression> {
    with_context(
        preceded(
            parse_open_bracket(),
            choice(vec![
                Box::new(map(parse_close_bracket(), |_| {
                    Expression::ListLiteral(vec![])
                })),
                Box::new(map(
                    tuple2(
                        lazy(parse_expression),
                        choice(vec![
                            Box::new(map(parse_range_tail(), |(upper, inclusive)| {
                                BracketTail::Range(upper, inclusive)
                            })),
                            Box::new(map(
                                tuple2(
                                    many(preceded(parse_comma(), lazy(parse_expression))),
                                    parse_close_bracket(),
                                ),
                                |(rest, _)| BracketTail::List(rest),
                            )),
                        ]),
                    ),
                    |(first, tail)| match tail {
                        BracketTail::Range(upper, upper_inclusive) => {
                            Expression::range(first, upper, true, upper_inclusive)
                        }
                        BracketTail::List(rest) => Expression::ListLiteral(
                            std::iter::once(first).chain(rest).collect(),
                        ),
                    },
                )),
            ]),
        ),
        "list or interval",
    )
}

/// `] lower .. upper ]`
fn parse_left_open_range() -> impl Parser<Token, Expression> {
    with_context(
        map(
            preceded(
                parse_close_bracket(),
                tuple2(lazy(parse_expression), parse_range_tail()),
            ),
            |(lower, (upper, upper_inclusive))| {
                Expression::range(lower, upper, false, upper_inclusive)
            },
        ),
        "interval",
    )
}

fn parse_context_key() -> impl Parser<Token, String> {
    with_context(
        choice(vec![
            Box::new(parse_identifier()),
            Box::new(parse_string_literal()),
        ]),
        "context key",
    )
}

fn parse_context_literal() -> impl Parser<Token, Expression> {
    with_context(
        map(
            delimited(
                parse_open_brace(),
                separated_list(
                    map(
                        tuple3(parse_context_key(), parse_colon(), lazy(parse_expression)),
                        |(key, _, value)| (key, value),
                    ),
                    parse_comma(),
                ),
                parse_close_brace(),
            ),
            Expression::ContextLiteral,
        ),
        "context literal",
    )
}
