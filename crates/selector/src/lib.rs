//! The selector engine: compiled query chains, axis traversal, predicate
//! positions and identity-preserving rewrites over any [`TreeNode`].
//!
//! [`TreeNode`]: thicket_tree::TreeNode

pub mod axes;
pub mod compiler;
pub mod context;
pub mod error;
pub mod rewrite;
pub mod selector;

pub use axes::{Axis, Walk};
pub use compiler::{Compiler, NamePolicy};
pub use context::{Finisher, Progress, TraversalContext, TraversalContextBuilder};
pub use error::SelectError;
pub use selector::{NameTest, Predicate, Selector, Step};
