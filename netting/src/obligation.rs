use std::fmt;

use dualnet_types::{Amount, ParticipantId};
use serde::{Deserialize, Serialize};

/// Queue-assigned id. Higher ids were queued later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObligationId(u64);

impl ObligationId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObligationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obl-{}", self.0)
    }
}

/// Ordered lowest to highest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
    Critical,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: ObligationId,
    pub sender: ParticipantId,
    pub receiver: ParticipantId,
    pub amount: Amount,
    pub priority: Priority,
}
