//! The expression tree evaluated inside a predicate.

use std::fmt;
use thicket_types::Numeric;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    Number(Numeric),
    Text(String),
    /// `@name`; evaluates to [`crate::Value::Absent`] when the node lacks it.
    Attribute(String),
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    Binary {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    Negate(Box<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Logical
    Or,
    And,
    // Equality
    Equals,
    NotEquals,
    // Relational
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    // Additive
    Plus,
    Minus,
    // Multiplicative
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Or => "or",
            BinaryOperator::And => "and",
            BinaryOperator::Equals => "=",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "div",
            BinaryOperator::Modulo => "mod",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Equals
            | BinaryOperator::NotEquals
            | BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual => 3,
            BinaryOperator::Plus | BinaryOperator::Minus => 4,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 5,
        }
    }
}

impl Expression {
    pub fn number(value: impl Into<Numeric>) -> Self {
        Expression::Number(value.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Expression::Text(value.into())
    }

    pub fn attribute(name: impl Into<String>) -> Self {
        Expression::Attribute(name.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            name: name.into(),
            args,
        }
    }

    pub fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn negate(inner: Expression) -> Self {
        Expression::Negate(Box::new(inner))
    }

    /// Names of every function called anywhere in this expression, in source order.
    pub fn function_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_function_names(&mut names);
        names
    }

    fn collect_function_names<'e>(&'e self, names: &mut Vec<&'e str>) {
        match self {
            Expression::FunctionCall { name, args } => {
                names.push(name);
                for arg in args {
                    arg.collect_function_names(names);
                }
            }
            Expression::Binary { left, right, .. } => {
                left.collect_function_names(names);
                right.collect_function_names(names);
            }
            Expression::Negate(inner) => inner.collect_function_names(names),
            Expression::Number(_) | Expression::Text(_) | Expression::Attribute(_) => {}
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expression::Binary { op, .. } => op.precedence(),
            _ => u8::MAX,
        }
    }
}

/// Renders query syntax, adding parentheses only where precedence requires them.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(n) => write!(f, "{n}"),
            Expression::Text(t) if t.contains('\'') => write!(f, "\"{t}\""),
            Expression::Text(t) => write!(f, "'{t}'"),
            Expression::Attribute(name) => write!(f, "@{name}"),
            Expression::FunctionCall { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expression::Binary { left, op, right } => {
                let prec = op.precedence();
                if left.precedence() < prec {
                    write!(f, "({left})")?;
                } else {
                    write!(f, "{left}")?;
                }
                write!(f, " {} ", op.as_str())?;
                if right.precedence() <= prec {
                    write!(f, "({right})")
                } else {
                    write!(f, "{right}")
                }
            }
            Expression::Negate(inner) if matches!(**inner, Expression::Binary { .. }) => {
                write!(f, "-({inner})")
            }
            Expression::Negate(inner) => write!(f, "-{inner}"),
        }
    }
}
