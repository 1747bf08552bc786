//! Foundation types shared by every thicket crate.
//!
//! Query literals and predicate arithmetic run under a caller-selected numeric
//! representation: fixed-precision decimals (the default) or IEEE doubles.

pub mod numeric;

pub use numeric::{MathContext, Numeric, NumericConfig, NumericError, NumericKind, RoundingMode};
