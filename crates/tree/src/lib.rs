//! Defines the capabilities a tree must offer to be queried and rewritten.
//!
//! The selector engine never constructs or destroys nodes of its own accord. It
//! navigates through [`TreeNode`] and, when rewriting, asks the owning node for a
//! copy with new children through [`Rebuild`].

pub mod element;
pub mod fixtures;

pub use element::ElementNode;

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::iter;

/// The name type of a tree's nodes. Names are owned values, so the engine can
/// keep them in compiled selectors and name factories.
pub trait NodeName: Clone + Eq + Hash + Debug + Display + 'static {
    /// Builds a name from the text of a query step. This is the default name factory.
    fn from_query(text: &str) -> Self;
}

impl NodeName for String {
    fn from_query(text: &str) -> Self {
        text.to_string()
    }
}

/// The universal contract for a node in an immutable, hierarchical tree.
///
/// `Eq` and `Hash` must describe node *identity*: two handles are equal when they
/// point at the same position of the same tree, not when their contents match.
pub trait TreeNode: Clone + Eq + Hash + Debug {
    type Name: NodeName;

    fn name(&self) -> Self::Name;

    /// The children of this node, first to last.
    fn children(&self) -> Vec<Self>;

    /// Returns `None` for the root.
    fn parent(&self) -> Option<Self>;

    fn attribute(&self, name: &str) -> Option<String>;

    /// Scalar content carried by the node itself, if any.
    fn value(&self) -> Option<String> {
        None
    }

    fn first_child(&self) -> Option<Self> {
        self.children().into_iter().next()
    }

    fn last_child(&self) -> Option<Self> {
        self.children().pop()
    }

    /// Later siblings in document order.
    fn following_siblings(&self) -> Vec<Self> {
        let Some(parent) = self.parent() else {
            return Vec::new();
        };
        parent
            .children()
            .into_iter()
            .skip_while(|sibling| sibling != self)
            .skip(1)
            .collect()
    }

    /// Earlier siblings, nearest first.
    fn preceding_siblings(&self) -> Vec<Self> {
        let Some(parent) = self.parent() else {
            return Vec::new();
        };
        let mut siblings: Vec<Self> = parent
            .children()
            .into_iter()
            .take_while(|sibling| sibling != self)
            .collect();
        siblings.reverse();
        siblings
    }

    /// Parents walked upward to the root, nearest first.
    fn ancestors(&self) -> Vec<Self> {
        iter::successors(self.parent(), |node| node.parent()).collect()
    }

    fn root(&self) -> Self {
        self.ancestors().pop().unwrap_or_else(|| self.clone())
    }
}

/// Produces modified copies of a node for identity-preserving rewrites.
pub trait Rebuild: TreeNode {
    /// Returns a new node like `self` but with `children` in place of its own.
    /// `self` is left untouched.
    fn with_children(&self, children: Vec<Self>) -> Self;
}
