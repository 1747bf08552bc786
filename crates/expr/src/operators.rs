//! Comparison and arithmetic between two evaluated operands.
//!
//! `and` and `or` short-circuit and are handled by the engine before both sides
//! are evaluated; everything else lands here.

use crate::ast::BinaryOperator;
use crate::error::ExprError;
use crate::value::Value;
use std::cmp::Ordering;
use thicket_types::{MathContext, Numeric, NumericConfig, NumericError};

pub fn evaluate(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
    config: &NumericConfig,
) -> Result<Value, ExprError> {
    match op {
        BinaryOperator::Or => Ok(Value::Boolean(left.to_boolean() || right.to_boolean())),
        BinaryOperator::And => Ok(Value::Boolean(left.to_boolean() && right.to_boolean())),
        BinaryOperator::Equals => equals(left, right, config).map(Value::Boolean),
        BinaryOperator::NotEquals => not_equals(left, right, config).map(Value::Boolean),
        BinaryOperator::LessThan => relational(left, right, config, Ordering::is_lt),
        BinaryOperator::LessThanOrEqual => relational(left, right, config, Ordering::is_le),
        BinaryOperator::GreaterThan => relational(left, right, config, Ordering::is_gt),
        BinaryOperator::GreaterThanOrEqual => relational(left, right, config, Ordering::is_ge),
        BinaryOperator::Plus => arithmetic(left, right, config, Numeric::add),
        BinaryOperator::Minus => arithmetic(left, right, config, Numeric::sub),
        BinaryOperator::Multiply => arithmetic(left, right, config, Numeric::mul),
        BinaryOperator::Divide => arithmetic(left, right, config, Numeric::div),
        BinaryOperator::Modulo => arithmetic(left, right, config, Numeric::rem),
    }
}

/// Booleans compare as booleans if either side is one, then numbers if either
/// side is a number, otherwise text.
fn equals(left: &Value, right: &Value, config: &NumericConfig) -> Result<bool, ExprError> {
    if left.is_absent() || right.is_absent() {
        return Ok(false);
    }
    match (left, right) {
        (Value::Boolean(_), _) | (_, Value::Boolean(_)) => Ok(left.to_boolean() == right.to_boolean()),
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            let ordering = compare_numbers(left, right, config)?;
            Ok(ordering == Some(Ordering::Equal))
        }
        _ => Ok(left.to_text() == right.to_text()),
    }
}

fn not_equals(left: &Value, right: &Value, config: &NumericConfig) -> Result<bool, ExprError> {
    if left.is_absent() || right.is_absent() {
        return Ok(false);
    }
    equals(left, right, config).map(|eq| !eq)
}

fn relational(
    left: &Value,
    right: &Value,
    config: &NumericConfig,
    holds: fn(Ordering) -> bool,
) -> Result<Value, ExprError> {
    if left.is_absent() || right.is_absent() {
        return Ok(Value::Boolean(false));
    }
    let ordering = compare_numbers(left, right, config)?;
    Ok(Value::Boolean(ordering.is_some_and(holds)))
}

/// `None` when either side is NaN.
fn compare_numbers(
    left: &Value,
    right: &Value,
    config: &NumericConfig,
) -> Result<Option<Ordering>, ExprError> {
    let a = left.to_number(config)?;
    let b = right.to_number(config)?;
    Ok(a.compare(&b))
}

fn arithmetic(
    left: &Value,
    right: &Value,
    config: &NumericConfig,
    operation: fn(Numeric, Numeric, &MathContext) -> Result<Numeric, NumericError>,
) -> Result<Value, ExprError> {
    if left.is_absent() || right.is_absent() {
        return Ok(Value::Absent);
    }
    let a = left.to_number(config)?;
    let b = right.to_number(config)?;
    Ok(Value::Number(operation(a, b, &config.math)?))
}

pub fn negate(value: &Value, config: &NumericConfig) -> Result<Value, ExprError> {
    if value.is_absent() {
        return Ok(Value::Absent);
    }
    Ok(Value::Number(value.to_number(config)?.negate()))
}

/// Applies a numeric rounding function, passing absent values through.
pub fn map_number(
    value: &Value,
    config: &NumericConfig,
    f: fn(Numeric) -> Numeric,
) -> Result<Value, ExprError> {
    if value.is_absent() {
        return Ok(Value::Absent);
    }
    Ok(Value::Number(f(value.to_number(config)?)))
}
