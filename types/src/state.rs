//! Status machines for settlements and the payments they carry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a settlement batch.
///
/// ```text
/// Pending → Processing → Submitted → Confirmed → Completed
///               │            │           │
///               └→ Failed ←──┘           └→ Reconciled
///                            └→ Reconciled
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementStatus {
    Pending,
    Processing,
    Submitted,
    Confirmed,
    Completed,
    Failed,
    Reconciled,
}

impl SettlementStatus {
    /// Whether `self → next` is a legal single step.
    pub fn can_transition_to(&self, next: SettlementStatus) -> bool {
        use SettlementStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Submitted)
                | (Processing, Failed)
                | (Submitted, Confirmed)
                | (Submitted, Failed)
                | (Submitted, Reconciled)
                | (Confirmed, Completed)
                | (Confirmed, Reconciled)
        )
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Reconciled)
    }

    /// Position along the happy path, used to assert monotonic progress.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Submitted => 2,
            Self::Confirmed => 3,
            Self::Completed | Self::Failed | Self::Reconciled => 4,
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Lifecycle of a single payment awaiting settlement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Waiting to be batched.
    Pending,
    /// Assigned to a settlement in flight.
    Processing,
    /// Settled on a network.
    Completed,
    /// Gave up; carries the reason.
    Failed(String),
}

impl PaymentStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}
