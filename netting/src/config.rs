use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NettingConfig {
    /// Whether Critical obligations may be deferred to restore solvency.
    /// When off, an insolvent participant left with only Critical
    /// obligations is an inconsistency.
    pub defer_critical: bool,
}

impl Default for NettingConfig {
    fn default() -> Self {
        Self {
            defer_critical: true,
        }
    }
}
