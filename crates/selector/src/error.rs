use thicket_expr::ExprError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectError {
    #[error("function '{function}' not found in predicate [{predicate}]")]
    FunctionNotFound { function: String, predicate: String },

    #[error("predicate [{predicate}] failed: {source}")]
    Evaluation {
        predicate: String,
        #[source]
        source: ExprError,
    },

    #[error("name '{name}' is not allowed by the name policy")]
    IllegalName { name: String },

    #[error("cannot compile a {found} token as a {expected}")]
    UnexpectedToken {
        expected: &'static str,
        found: &'static str,
    },
}
