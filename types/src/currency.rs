//! Currency pair used to group payments into settlement batches.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A source/target currency pair, e.g. `USD/EUR`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub source: String,
    pub target: String,
}

impl CurrencyPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Whether both legs are three-letter uppercase codes.
    pub fn is_valid(&self) -> bool {
        fn code_ok(code: &str) -> bool {
            code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
        }
        code_ok(&self.source) && code_ok(&self.target)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.target)
    }
}
