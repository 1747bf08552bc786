//! Settings applied when a query is compiled and run.

use serde::{Deserialize, Serialize};
use thicket_selector::NamePolicy;
use thicket_tree::NodeName;
use thicket_types::NumericConfig;

/// Which names a query may mention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameCase {
    /// Any name the grammar accepts.
    #[default]
    Exact,
    /// Names must not contain uppercase letters.
    LowerOnly,
}

impl NameCase {
    pub fn policy<Name: NodeName>(self) -> NamePolicy<Name> {
        match self {
            NameCase::Exact => NamePolicy::permissive(),
            NameCase::LowerOnly => NamePolicy::accepting(|name| !name.chars().any(char::is_uppercase)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Representation and rounding for number literals and predicate arithmetic.
    pub numeric: NumericConfig,
    pub names: NameCase,
}

impl QueryConfig {
    pub fn with_numeric(mut self, numeric: NumericConfig) -> Self {
        self.numeric = numeric;
        self
    }

    pub fn with_names(mut self, names: NameCase) -> Self {
        self.names = names;
        self
    }
}
