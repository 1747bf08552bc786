use thicket_types::NumericError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("function '{name}' not found")]
    FunctionNotFound { name: String },

    #[error("function '{function}' expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: String,
        found: usize,
    },

    #[error("cannot convert {value} to a number")]
    Conversion { value: String },

    #[error("arithmetic failed: {0}")]
    Numeric(#[from] NumericError),
}
