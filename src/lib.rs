//! Thicket: a query language for selecting and rewriting nodes in immutable trees.
//!
//! A query such as `//branch[@id > 1]/*[position() = 2]` is parsed into a
//! lossless syntax tree, compiled into a [`Selector`] chain, and run over any
//! tree that implements [`TreeNode`]. Selection reports matches; [`Query::map`]
//! returns a rewritten tree that shares every untouched subtree with its input.
//!
//! ```
//! use thicket::{Query, fixtures};
//!
//! let root = fixtures::forest();
//! let query = Query::compile("branch[2]/*").unwrap();
//! let ids = fixtures::ids(&query.select(&root).unwrap());
//! assert_eq!(ids, ["c", "d", "f"]);
//! ```

pub mod config;
pub mod error;
pub mod query;

pub use config::{NameCase, QueryConfig};
pub use error::QueryError;
pub use query::Query;

pub use thicket_expr::{EvaluationContext, ExprError, Expression, Function, FunctionRegistry, Value};
pub use thicket_grammar::{SyntaxError, Token, TreePrinter, outline, parse, parse_with, walk};
pub use thicket_selector::{
    Axis, Compiler, Finisher, NamePolicy, Progress, SelectError, Selector, TraversalContext,
};
pub use thicket_tree::{ElementNode, NodeName, Rebuild, TreeNode, fixtures};
pub use thicket_types::{MathContext, Numeric, NumericConfig, NumericKind, RoundingMode};
