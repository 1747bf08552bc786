//! Runtime values produced by evaluating an expression.

use crate::error::ExprError;
use std::fmt;
use thicket_types::{Numeric, NumericConfig};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Number(Numeric),
    Text(String),
    /// A missing attribute. Never equal to anything, not even itself.
    Absent,
}

impl Value {
    /// Booleans as-is; numbers are true unless zero or NaN; text unless empty.
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Number(n) => !n.is_zero() && !n.is_nan(),
            Value::Text(t) => !t.is_empty(),
            Value::Absent => false,
        }
    }

    /// Converts to a number in the configured representation. Text must be a
    /// plain decimal literal, optionally surrounded by whitespace.
    pub fn to_number(&self, config: &NumericConfig) -> Result<Numeric, ExprError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Boolean(b) => Ok(Numeric::integer(i64::from(*b), config.kind)),
            Value::Text(t) => Numeric::parse(t, config).map_err(|_| ExprError::Conversion {
                value: format!("'{t}'"),
            }),
            Value::Absent => Err(ExprError::Conversion {
                value: "an absent value".to_string(),
            }),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Text(t) => t.clone(),
            Value::Absent => String::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Absent => "absent",
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Numeric> for Value {
    fn from(value: Numeric) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}
