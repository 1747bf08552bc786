//! Evaluates an [`Expression`] against a single node.

use crate::ast::{BinaryOperator, Expression};
use crate::error::ExprError;
use crate::functions::FunctionRegistry;
use crate::operators;
use crate::value::Value;
use thicket_tree::TreeNode;
use thicket_types::NumericConfig;

/// Everything a predicate can see while it is evaluated: the node under test,
/// its 1-based position within the current predicate scope, the callable
/// functions and the numeric settings.
pub struct EvaluationContext<'c, N> {
    pub node: &'c N,
    pub position: usize,
    pub functions: &'c FunctionRegistry<N>,
    pub numeric: NumericConfig,
}

impl<'c, N> EvaluationContext<'c, N> {
    pub fn new(
        node: &'c N,
        position: usize,
        functions: &'c FunctionRegistry<N>,
        numeric: NumericConfig,
    ) -> Self {
        Self {
            node,
            position,
            functions,
            numeric,
        }
    }
}

pub fn evaluate<N: TreeNode>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'_, N>,
) -> Result<Value, ExprError> {
    match expr {
        Expression::Number(n) => Ok(Value::Number(*n)),
        Expression::Text(t) => Ok(Value::Text(t.clone())),
        Expression::Attribute(name) => Ok(e_ctx.node.attribute(name).map_or(Value::Absent, Value::Text)),
        Expression::FunctionCall { name, args } => {
            let function = e_ctx
                .functions
                .get(name)
                .ok_or_else(|| ExprError::FunctionNotFound { name: name.clone() })?;
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, e_ctx)?);
            }
            log::trace!("calling {name}() with {evaluated_args:?}");
            function(e_ctx, evaluated_args)
        }
        Expression::Binary {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            if !evaluate(left, e_ctx)?.to_boolean() {
                return Ok(Value::Boolean(false));
            }
            Ok(Value::Boolean(evaluate(right, e_ctx)?.to_boolean()))
        }
        Expression::Binary {
            left,
            op: BinaryOperator::Or,
            right,
        } => {
            if evaluate(left, e_ctx)?.to_boolean() {
                return Ok(Value::Boolean(true));
            }
            Ok(Value::Boolean(evaluate(right, e_ctx)?.to_boolean()))
        }
        Expression::Binary { left, op, right } => {
            let left_val = evaluate(left, e_ctx)?;
            let right_val = evaluate(right, e_ctx)?;
            operators::evaluate(*op, &left_val, &right_val, &e_ctx.numeric)
        }
        Expression::Negate(inner) => {
            let val = evaluate(inner, e_ctx)?;
            operators::negate(&val, &e_ctx.numeric)
        }
    }
}
