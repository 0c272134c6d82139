//! # Expression AST
//!
//! The canonical tree produced by the [`analyzer`](crate::analyzer). Nodes are plain owned
//! values: no back-references, no sharing, immutable once built. The evaluator matches on
//! [`Expression`] exhaustively, so a new node kind does not compile until every consumer
//! handles it.
//!
//! The constructors on [`Expression`] perform the small canonicalizations the grammar relies
//! on: negated number literals fold into negative literals and plain identifier chains
//! `a.b.c` collapse into a single dotted [`Expression::Variable`].

use std::fmt;

use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "null"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum BinaryOperator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Modulo,
    #[strum(serialize = "**")]
    Power,
    #[strum(serialize = "=")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = "<")]
    LessThan,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = "<=")]
    LessThanEqual,
    #[strum(serialize = ">=")]
    GreaterThanEqual,
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
    /// Membership: `x in [1, 2]`, `x in [1..10]`.
    #[strum(serialize = "in")]
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum UnaryOperator {
    #[strum(serialize = "-")]
    Negate,
    #[strum(serialize = "not")]
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Quantifier {
    Some,
    Every,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    /// A name or dotted path, resolved against the evaluation context.
    Variable(String),
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    Range {
        lower: Box<Expression>,
        upper: Box<Expression>,
        lower_inclusive: bool,
        upper_inclusive: bool,
    },
    ListLiteral(Vec<Expression>),
    /// Entries keep their declaration order.
    ContextLiteral(Vec<(String, Expression)>),
    FunctionCall {
        function: String,
        arguments: Vec<Expression>,
    },
    PropertyAccess {
        base: Box<Expression>,
        key: String,
    },
    If {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Box<Expression>,
    },
    ForExpression {
        variable: String,
        source: Box<Expression>,
        body: Box<Expression>,
    },
    Quantified {
        quantifier: Quantifier,
        variable: String,
        source: Box<Expression>,
        predicate: Box<Expression>,
    },
    Between {
        expression: Box<Expression>,
        lower: Box<Expression>,
        upper: Box<Expression>,
    },
    InstanceOf {
        expression: Box<Expression>,
        type_name: String,
    },
    /// `list[expr]`: index when `expr` is a number, otherwise a per-item predicate.
    Filter {
        base: Box<Expression>,
        filter: Box<Expression>,
    },
}

impl Expression {
    pub fn number(n: f64) -> Self {
        Expression::Literal(Literal::Number(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expression::Literal(Literal::String(s.into()))
    }

    pub fn variable(path: impl Into<String>) -> Self {
        Expression::Variable(path.into())
    }

    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Unary minus on a number literal folds into a negative literal.
    pub fn negate(operand: Expression) -> Self {
        match operand {
            Expression::Literal(Literal::Number(n)) => Expression::number(-n),
            operand => Expression::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            },
        }
    }

    pub fn not(operand: Expression) -> Self {
        Expression::UnaryOp {
            op: UnaryOperator::Not,
            operand: Box::new(operand),
        }
    }

    /// `a.b` on a plain variable extends the dotted path, anything else becomes a
    /// [`Expression::PropertyAccess`].
    pub fn property(base: Expression, key: impl Into<String>) -> Self {
        let key = key.into();
        match base {
            Expression::Variable(path) => Expression::Variable(format!("{}.{}", path, key)),
            base => Expression::PropertyAccess {
                base: Box::new(base),
                key,
            },
        }
    }

    pub fn range(
        lower: Expression,
        upper: Expression,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> Self {
        Expression::Range {
            lower: Box::new(lower),
            upper: Box::new(upper),
            lower_inclusive,
            upper_inclusive,
        }
    }

    /// Whether any variable in the tree is `name` or a dotted path rooted at `name`.
    pub fn mentions_variable(&self, name: &str) -> bool {
        let mut found = false;
        self.visit(&mut |expr| {
            if let Expression::Variable(path) = expr {
                if path == name
                    || path
                        .strip_prefix(name)
                        .is_some_and(|rest| rest.starts_with('.'))
                {
                    found = true;
                }
            }
        });
        found
    }

    /// Pre-order traversal over this node and all of its descendants.
    pub fn visit(&self, f: &mut dyn FnMut(&Expression)) {
        f(self);
        match self {
            Expression::Literal(_) | Expression::Variable(_) => {}
            Expression::BinaryOp { left, right, .. } => {
                left.visit(f);
                right.visit(f);
            }
            Expression::UnaryOp { operand, .. } => operand.visit(f),
            Expression::Range { lower, upper, .. } => {
                lower.visit(f);
                upper.visit(f);
            }
            Expression::ListLiteral(items) => items.iter().for_each(|item| item.visit(f)),
            Expression::ContextLiteral(entries) => {
                entries.iter().for_each(|(_, value)| value.visit(f))
            }
            Expression::FunctionCall { arguments, .. } => {
                arguments.iter().for_each(|arg| arg.visit(f))
            }
            Expression::PropertyAccess { base, .. } => base.visit(f),
            Expression::If {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.visit(f);
                then_branch.visit(f);
                else_branch.visit(f);
            }
            Expression::ForExpression { source, body, .. } => {
                source.visit(f);
                body.visit(f);
            }
            Expression::Quantified {
                source, predicate, ..
            } => {
                source.visit(f);
                predicate.visit(f);
            }
            Expression::Between {
                expression,
                lower,
                upper,
            } => {
                expression.visit(f);
                lower.visit(f);
                upper.visit(f);
            }
            Expression::InstanceOf { expression, .. } => expression.visit(f),
            Expression::Filter { base, filter } => {
                base.visit(f);
                filter.visit(f);
            }
        }
    }
}

/// One test of a rule input cell.
#[derive(Debug, Clone, PartialEq)]
pub enum UnaryTest {
    /// `< 18`, `>= 10`, `!= "x"`: the input is the implicit left operand.
    Comparison {
        op: BinaryOperator,
        value: Expression,
    },
    /// Interval, list, literal or predicate over the input.
    Expression(Expression),
}

/// A complete rule input cell: `-`, or comma separated tests optionally wrapped in `not(...)`.
#[derive(Debug, Clone, PartialEq)]
pub enum UnaryTests {
    Any,
    Tests {
        negated: bool,
        tests: Vec<UnaryTest>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negate_folds_number_literal() {
        assert_eq!(Expression::negate(Expression::number(5.0)), Expression::number(-5.0));
        assert_eq!(
            Expression::negate(Expression::variable("x")),
            Expression::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(Expression::variable("x")),
            }
        );
    }

    #[test]
    fn test_property_on_variable_extends_path() {
        let expr = Expression::property(
            Expression::property(Expression::variable("applicant"), "address"),
            "city",
        );
        assert_eq!(expr, Expression::variable("applicant.address.city"));

        let call = Expression::FunctionCall {
            function: "date".to_string(),
            arguments: vec![Expression::string("2024-01-01")],
        };
        assert!(matches!(
            Expression::property(call, "year"),
            Expression::PropertyAccess { .. }
        ));
    }

    #[test]
    fn test_mentions_variable() {
        let expr = Expression::binary(
            BinaryOperator::And,
            Expression::variable("age.years"),
            Expression::variable("agent"),
        );
        assert!(expr.mentions_variable("age"));
        assert!(expr.mentions_variable("agent"));
        assert!(!expr.mentions_variable("ag"));
        assert!(!expr.mentions_variable("years"));
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(BinaryOperator::GreaterThanEqual.to_string(), ">=");
        assert_eq!(BinaryOperator::In.to_string(), "in");
        assert_eq!(UnaryOperator::Not.to_string(), "not");
        assert_eq!("every".parse::<Quantifier>(), Ok(Quantifier::Every));
    }
}
