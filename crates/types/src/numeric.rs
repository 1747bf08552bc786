//! Numeric values under a caller-selected representation and rounding context.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("'{0}' is not a number")]
    InvalidLiteral(String),

    #[error("numeric overflow during {0}")]
    Overflow(&'static str),

    #[error("division by zero")]
    DivisionByZero,

    #[error("'{0}' is outside the range of a decimal")]
    OutOfRange(String),
}

/// Which representation number literals and arithmetic results use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumericKind {
    /// Fixed-precision decimal, rounded by the active [`MathContext`].
    #[default]
    Decimal,
    /// IEEE 754 double precision.
    Double,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingMode {
    Up,
    Down,
    Ceiling,
    Floor,
    HalfUp,
    HalfDown,
    #[default]
    HalfEven,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::Up => RoundingStrategy::AwayFromZero,
            RoundingMode::Down => RoundingStrategy::ToZero,
            RoundingMode::Ceiling => RoundingStrategy::ToPositiveInfinity,
            RoundingMode::Floor => RoundingStrategy::ToNegativeInfinity,
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfDown => RoundingStrategy::MidpointTowardZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

/// Precision and rounding applied to decimal literals and decimal arithmetic.
///
/// A decimal holds at most [`MathContext::MAX_PRECISION`] significant digits, so
/// wider precisions, and `0`, behave as that maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MathContext {
    /// Significant digits kept for decimal results. `0` keeps every digit.
    pub precision: u32,
    /// How results are rounded when they exceed `precision`.
    pub rounding: RoundingMode,
}

impl MathContext {
    /// 28 significant digits, half-even: the widest precision a decimal can hold.
    pub const DECIMAL: MathContext = MathContext {
        precision: 28,
        rounding: RoundingMode::HalfEven,
    };

    pub const MAX_PRECISION: u32 = 28;

    pub const UNLIMITED: MathContext = MathContext {
        precision: 0,
        rounding: RoundingMode::HalfUp,
    };

    pub fn new(precision: u32, rounding: RoundingMode) -> Self {
        Self {
            precision,
            rounding,
        }
    }

    /// The number of significant digits a decimal actually keeps under this context.
    pub fn significant_digits(&self) -> u32 {
        match self.precision {
            0 => Self::MAX_PRECISION,
            precision => precision.min(Self::MAX_PRECISION),
        }
    }

    pub fn round(&self, value: Decimal) -> Decimal {
        if self.precision == 0 || value.is_zero() {
            return value;
        }
        value
            .round_sf_with_strategy(self.significant_digits(), self.rounding.strategy())
            .unwrap_or(value)
    }

    /// Whether dropping digits from a magnitude should bump the last kept digit.
    /// `first` is the first dropped digit and `rest` says whether any later
    /// dropped digit is non-zero.
    fn rounds_up(&self, negative: bool, last_odd: bool, first: u8, rest: bool) -> bool {
        let discarded = first != 0 || rest;
        match self.rounding {
            RoundingMode::Up => discarded,
            RoundingMode::Down => false,
            RoundingMode::Ceiling => discarded && !negative,
            RoundingMode::Floor => discarded && negative,
            RoundingMode::HalfUp => first >= 5,
            RoundingMode::HalfDown => first > 5 || (first == 5 && rest),
            RoundingMode::HalfEven => first > 5 || (first == 5 && (rest || last_odd)),
        }
    }
}

impl Default for MathContext {
    fn default() -> Self {
        Self::DECIMAL
    }
}

/// The numeric settings threaded through parsing, compilation and evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumericConfig {
    pub kind: NumericKind,
    pub math: MathContext,
}

impl NumericConfig {
    pub fn new(kind: NumericKind, math: MathContext) -> Self {
        Self { kind, math }
    }

    pub fn double() -> Self {
        Self {
            kind: NumericKind::Double,
            math: MathContext::default(),
        }
    }
}

/// A number in one of the two supported representations.
///
/// Equality and hashing are structural: two decimals compare by value, two doubles
/// by bit pattern, and a decimal never equals a double. Use [`Numeric::compare`] for
/// value comparisons across representations.
#[derive(Debug, Clone, Copy)]
pub enum Numeric {
    Decimal(Decimal),
    Double(f64),
}

impl Numeric {
    /// Parses plain decimal notation (`12`, `-3.5`, `.25`) into the configured representation.
    pub fn parse(text: &str, config: &NumericConfig) -> Result<Self, NumericError> {
        let trimmed = text.trim();
        if !is_plain_number(trimmed) {
            return Err(NumericError::InvalidLiteral(text.to_string()));
        }
        match config.kind {
            NumericKind::Decimal => parse_decimal(trimmed, &config.math).map(Numeric::Decimal),
            NumericKind::Double => trimmed
                .parse::<f64>()
                .map(Numeric::Double)
                .map_err(|_| NumericError::InvalidLiteral(text.to_string())),
        }
    }

    pub fn integer(value: i64, kind: NumericKind) -> Self {
        match kind {
            NumericKind::Decimal => Numeric::Decimal(Decimal::from(value)),
            NumericKind::Double => Numeric::Double(value as f64),
        }
    }

    pub fn kind(&self) -> NumericKind {
        match self {
            Numeric::Decimal(_) => NumericKind::Decimal,
            Numeric::Double(_) => NumericKind::Double,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Numeric::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
            Numeric::Double(f) => *f,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Numeric::Decimal(d) => d.is_zero(),
            Numeric::Double(f) => *f == 0.0,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Numeric::Double(f) if f.is_nan())
    }

    pub fn add(self, other: Numeric, math: &MathContext) -> Result<Numeric, NumericError> {
        self.combine(other, math, "addition", Decimal::checked_add, |a, b| a + b)
    }

    pub fn sub(self, other: Numeric, math: &MathContext) -> Result<Numeric, NumericError> {
        self.combine(other, math, "subtraction", Decimal::checked_sub, |a, b| a - b)
    }

    pub fn mul(self, other: Numeric, math: &MathContext) -> Result<Numeric, NumericError> {
        self.combine(other, math, "multiplication", Decimal::checked_mul, |a, b| a * b)
    }

    pub fn div(self, other: Numeric, math: &MathContext) -> Result<Numeric, NumericError> {
        if matches!(other, Numeric::Decimal(d) if d.is_zero()) && self.kind() == NumericKind::Decimal {
            return Err(NumericError::DivisionByZero);
        }
        self.combine(other, math, "division", Decimal::checked_div, |a, b| a / b)
    }

    /// Remainder truncated toward zero; the result takes the sign of the dividend.
    pub fn rem(self, other: Numeric, math: &MathContext) -> Result<Numeric, NumericError> {
        if matches!(other, Numeric::Decimal(d) if d.is_zero()) && self.kind() == NumericKind::Decimal {
            return Err(NumericError::DivisionByZero);
        }
        self.combine(other, math, "remainder", Decimal::checked_rem, |a, b| a % b)
    }

    fn combine(
        self,
        other: Numeric,
        math: &MathContext,
        operation: &'static str,
        decimal: fn(Decimal, Decimal) -> Option<Decimal>,
        double: fn(f64, f64) -> f64,
    ) -> Result<Numeric, NumericError> {
        match (self, other) {
            (Numeric::Decimal(a), Numeric::Decimal(b)) => decimal(a, b)
                .map(|d| Numeric::Decimal(math.round(d)))
                .ok_or(NumericError::Overflow(operation)),
            (a, b) => Ok(Numeric::Double(double(a.to_f64(), b.to_f64()))),
        }
    }

    pub fn negate(self) -> Numeric {
        match self {
            Numeric::Decimal(d) => Numeric::Decimal(-d),
            Numeric::Double(f) => Numeric::Double(-f),
        }
    }

    pub fn abs(self) -> Numeric {
        match self {
            Numeric::Decimal(d) => Numeric::Decimal(d.abs()),
            Numeric::Double(f) => Numeric::Double(f.abs()),
        }
    }

    pub fn floor(self) -> Numeric {
        match self {
            Numeric::Decimal(d) => Numeric::Decimal(d.floor()),
            Numeric::Double(f) => Numeric::Double(f.floor()),
        }
    }

    pub fn ceiling(self) -> Numeric {
        match self {
            Numeric::Decimal(d) => Numeric::Decimal(d.ceil()),
            Numeric::Double(f) => Numeric::Double(f.ceil()),
        }
    }

    /// Rounds to the nearest integer, halves toward positive infinity.
    pub fn round(self) -> Numeric {
        match self {
            Numeric::Decimal(d) => Numeric::Decimal(
                d.checked_add(Decimal::new(5, 1))
                    .map(|shifted| shifted.floor())
                    .unwrap_or(d),
            ),
            Numeric::Double(f) => Numeric::Double((f + 0.5).floor()),
        }
    }

    /// Orders two numbers by value. Decimals compare exactly; anything involving a
    /// double compares as doubles, so NaN is unordered.
    pub fn compare(&self, other: &Numeric) -> Option<Ordering> {
        match (self, other) {
            (Numeric::Decimal(a), Numeric::Decimal(b)) => Some(a.cmp(b)),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    /// True when this number is exactly the given 1-based position.
    pub fn equals_position(&self, position: usize) -> bool {
        match self {
            Numeric::Decimal(d) => *d == Decimal::from(position as u64),
            Numeric::Double(f) => *f == position as f64,
        }
    }
}

/// Reads a plain literal as a decimal, rounding its digits to the context first
/// so that literals wider than a decimal can hold still parse. Only a whole
/// part beyond the decimal range is an error.
fn parse_decimal(text: &str, math: &MathContext) -> Result<Decimal, NumericError> {
    let negative = text.starts_with('-');
    let unsigned = text.trim_start_matches('-');
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let whole = whole.trim_start_matches('0');

    let mut digits: Vec<u8> = whole.bytes().chain(fraction.bytes()).map(|b| b - b'0').collect();
    let mut whole_len = whole.len();
    let Some(lead) = digits.iter().position(|&d| d != 0) else {
        return Ok(Decimal::ZERO);
    };

    let keep = (lead + math.significant_digits() as usize)
        .min(whole_len + MathContext::MAX_PRECISION as usize);
    if keep < digits.len() {
        let dropped = digits.split_off(keep);
        let last_odd = digits.last().is_some_and(|d| d % 2 == 1);
        let rest = dropped[1..].iter().any(|&d| d != 0);
        if math.rounds_up(negative, last_odd, dropped[0], rest) && increment(&mut digits) {
            digits.insert(0, 1);
            whole_len += 1;
        }
    }
    if digits.iter().all(|&d| d == 0) {
        return Ok(Decimal::ZERO);
    }
    if digits.len() < whole_len {
        digits.resize(whole_len, 0);
    }

    let (whole_digits, fraction_digits) = digits.split_at(whole_len);
    let render = |part: &[u8]| part.iter().map(|d| char::from(b'0' + d)).collect::<String>();
    let mut normalized = String::with_capacity(digits.len() + 3);
    if negative {
        normalized.push('-');
    }
    if whole_digits.is_empty() {
        normalized.push('0');
    }
    normalized.push_str(&render(whole_digits));
    if !fraction_digits.is_empty() {
        normalized.push('.');
        normalized.push_str(&render(fraction_digits));
    }
    Decimal::from_str(&normalized).map_err(|_| NumericError::OutOfRange(text.to_string()))
}

/// Adds one to the last digit, carrying leftwards. Returns `true` when the carry
/// runs off the front.
fn increment(digits: &mut [u8]) -> bool {
    for digit in digits.iter_mut().rev() {
        if *digit == 9 {
            *digit = 0;
        } else {
            *digit += 1;
            return false;
        }
    }
    true
}

fn is_plain_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits, None),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    match fraction {
        None => !whole.is_empty() && all_digits(whole),
        Some(fraction) => {
            all_digits(whole) && all_digits(fraction) && !(whole.is_empty() && fraction.is_empty())
        }
    }
}

impl PartialEq for Numeric {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Numeric::Decimal(a), Numeric::Decimal(b)) => a == b,
            (Numeric::Double(a), Numeric::Double(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Numeric {}

impl Hash for Numeric {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Numeric::Decimal(d) => {
                0u8.hash(state);
                d.hash(state);
            }
            Numeric::Double(f) => {
                1u8.hash(state);
                f.to_bits().hash(state);
            }
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Decimal(d) => write!(f, "{}", d.normalize()),
            Numeric::Double(v) if v.is_nan() => write!(f, "NaN"),
            Numeric::Double(v) if v.is_infinite() => {
                write!(f, "{}", if *v > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Numeric::Double(v) => write!(f, "{}", v),
        }
    }
}

impl From<Decimal> for Numeric {
    fn from(value: Decimal) -> Self {
        Numeric::Decimal(value)
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Double(value)
    }
}

impl From<i64> for Numeric {
    fn from(value: i64) -> Self {
        Numeric::Decimal(Decimal::from(value))
    }
}
