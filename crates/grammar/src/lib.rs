//! Grammar for thicket queries.
//!
//! [`parse`] turns query text such as `//branch[@id > 1]/*[2]` into a lossless
//! [`Token`] tree: printing the tree gives back the exact input, whitespace
//! included. Trees are inspected with a [`Visitor`] driven by [`walk`].

pub mod error;
pub mod parser;
pub mod syntax;
pub mod visit;

pub use error::{Production, SyntaxError};
pub use parser::{parse, parse_with};
pub use syntax::{AxisKeyword, BinaryOperator, Leaf, LeafKind, Parent, ParentKind, Symbol, Token};
pub use visit::{TreePrinter, Visit, Visitor, outline, walk};
