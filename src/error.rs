use thicket_grammar::SyntaxError;
use thicket_selector::SelectError;
use thiserror::Error;

/// Anything that can go wrong between query text and a result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Select(#[from] SelectError),
}
