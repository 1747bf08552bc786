//! Predicate expressions: the syntax tree, runtime values, operators and the
//! function registry, plus the evaluator that ties them to a [`TreeNode`].
//!
//! [`TreeNode`]: thicket_tree::TreeNode

pub mod ast;
pub mod engine;
pub mod error;
pub mod functions;
pub mod operators;
pub mod value;

pub use ast::{BinaryOperator, Expression};
pub use engine::{EvaluationContext, evaluate};
pub use error::ExprError;
pub use functions::{Function, FunctionRegistry};
pub use value::Value;
