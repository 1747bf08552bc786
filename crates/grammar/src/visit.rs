//! Walking a token tree.

use crate::syntax::{Leaf, LeafKind, Parent, Token};
use std::fmt::Write;

/// Returned from [`Visitor::start`] to decide whether a parent's children are walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    SkipChildren,
}

/// Hooks called by [`walk`]. Implementors match on [`Parent::kind`] and
/// [`Leaf::kind`] to handle specific token kinds.
pub trait Visitor {
    /// Called before any token, leaf or parent.
    fn enter(&mut self, _token: &Token) {}

    /// Called after any token, once its children (if walked) are done.
    fn leave(&mut self, _token: &Token) {}

    fn start(&mut self, _parent: &Parent) -> Visit {
        Visit::Continue
    }

    /// Called for every parent, including those whose children were skipped.
    fn end(&mut self, _parent: &Parent) {}

    fn leaf(&mut self, _leaf: &Leaf) {}
}

pub fn walk<V: Visitor + ?Sized>(token: &Token, visitor: &mut V) {
    visitor.enter(token);
    match token {
        Token::Leaf(leaf) => visitor.leaf(leaf),
        Token::Parent(parent) => {
            if visitor.start(parent) == Visit::Continue {
                for child in parent.children() {
                    walk(child, visitor);
                }
            }
            visitor.end(parent);
        }
    }
    visitor.leave(token);
}

/// Renders a token tree as an indented outline, one token per line.
#[derive(Debug, Default)]
pub struct TreePrinter {
    depth: usize,
    out: String,
    /// Leave whitespace leaves out of the outline.
    pub hide_whitespace: bool,
}

impl TreePrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, label: &str, text: &str) {
        let _ = writeln!(self.out, "{:indent$}{label} {text:?}", "", indent = self.depth * 2);
    }
}

impl Visitor for TreePrinter {
    fn start(&mut self, parent: &Parent) -> Visit {
        self.line(parent.kind().label(), parent.text());
        self.depth += 1;
        Visit::Continue
    }

    fn end(&mut self, _parent: &Parent) {
        self.depth -= 1;
    }

    fn leaf(&mut self, leaf: &Leaf) {
        if self.hide_whitespace && *leaf.kind() == LeafKind::Whitespace {
            return;
        }
        self.line(leaf.kind().label(), leaf.text());
    }
}

/// Outline of `token` without whitespace leaves.
pub fn outline(token: &Token) -> String {
    let mut printer = TreePrinter {
        hide_whitespace: true,
        ..TreePrinter::default()
    };
    walk(token, &mut printer);
    printer.finish()
}
