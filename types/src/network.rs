//! Identifies which consensus subsystem a settlement is routed to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two settlement networks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    /// Committee-based sharded network with per-shard microblock DAGs.
    Sharded,
    /// Single-chain proof-of-stake network.
    Chain,
}

impl NetworkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sharded => "sharded",
            Self::Chain => "chain",
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
