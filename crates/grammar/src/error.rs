use std::collections::BTreeSet;
use std::fmt;
use thicket_types::NumericError;
use thiserror::Error;

/// Something the parser was prepared to accept at a given position.
///
/// The declaration order is the order in which expectations are listed in
/// error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Production {
    Slash,
    AxisPrefix,
    Name,
    Wildcard,
    OpenBracket,
    CloseBracket,
    Operator,
    Minus,
    Number,
    QuotedText,
    At,
    OpenParen,
    CloseParen,
    Comma,
    EndOfInput,
    /// Expressions nested no deeper than the parser allows.
    ShallowerNesting,
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Production::Slash => "'/'",
            Production::AxisPrefix => "axis prefix",
            Production::Name => "name",
            Production::Wildcard => "'*'",
            Production::OpenBracket => "'['",
            Production::CloseBracket => "']'",
            Production::Operator => "operator",
            Production::Minus => "'-'",
            Production::Number => "number",
            Production::QuotedText => "quoted text",
            Production::At => "'@'",
            Production::OpenParen => "'('",
            Production::CloseParen => "')'",
            Production::Comma => "','",
            Production::EndOfInput => "end of input",
            Production::ShallowerNesting => "shallower nesting",
        };
        f.write_str(text)
    }
}

/// A query that the grammar cannot consume.
///
/// `line` and `column` are 1-based and point at `found`, the first character the
/// parser could not get past (`None` at end of input). When a well-formed number
/// literal cannot be represented, `numeric` holds the reason and `expected` is
/// empty.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", message(.found, .line, .column, .expected, .numeric))]
pub struct SyntaxError {
    pub found: Option<char>,
    pub line: u32,
    pub column: usize,
    pub expected: BTreeSet<Production>,
    pub numeric: Option<NumericError>,
}

impl SyntaxError {
    pub fn new(
        found: Option<char>,
        line: u32,
        column: usize,
        expected: impl IntoIterator<Item = Production>,
    ) -> Self {
        Self {
            found,
            line,
            column,
            expected: expected.into_iter().collect(),
            numeric: None,
        }
    }

    /// A number literal starting at `line`/`column` that the numeric settings reject.
    pub fn numeric(found: Option<char>, line: u32, column: usize, error: NumericError) -> Self {
        Self {
            found,
            line,
            column,
            expected: BTreeSet::new(),
            numeric: Some(error),
        }
    }
}

fn message(
    found: &Option<char>,
    line: &u32,
    column: &usize,
    expected: &BTreeSet<Production>,
    numeric: &Option<NumericError>,
) -> String {
    match numeric {
        Some(error) => format!("invalid number at line {line}, column {column}: {error}"),
        None => format!(
            "unexpected {} at line {line}, column {column}; expected one of: {}",
            describe(found),
            list(expected)
        ),
    }
}

fn describe(found: &Option<char>) -> String {
    match found {
        Some(c) => format!("'{c}'"),
        None => "end of input".to_string(),
    }
}

fn list(expected: &BTreeSet<Production>) -> String {
    expected
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_lists_expectations_in_order() {
        let err = SyntaxError::new(
            Some(']'),
            2,
            7,
            [Production::EndOfInput, Production::Slash, Production::OpenBracket],
        );
        assert_eq!(
            err.to_string(),
            "unexpected ']' at line 2, column 7; expected one of: '/', '[', end of input"
        );
    }

    #[test]
    fn test_numeric_message() {
        let err = SyntaxError::numeric(
            Some('1'),
            1,
            3,
            NumericError::OutOfRange("100000000000000000000000000000".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "invalid number at line 1, column 3: \
             '100000000000000000000000000000' is outside the range of a decimal"
        );
    }

    #[test]
    fn test_message_at_end_of_input() {
        let err = SyntaxError::new(None, 1, 4, [Production::Name]);
        assert_eq!(
            err.to_string(),
            "unexpected end of input at line 1, column 4; expected one of: name"
        );
    }
}
