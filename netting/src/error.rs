use thiserror::Error;

use crate::ObligationId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NettingError {
    #[error("participant {0} not registered")]
    UnknownParticipant(String),

    #[error("participant {0} already registered")]
    DuplicateParticipant(String),

    #[error("obligation {0} not queued")]
    UnknownObligation(ObligationId),

    #[error("invalid obligation: {0}")]
    InvalidObligation(String),

    /// Nothing was applied; the queue is untouched.
    #[error("inconsistent state for participant {participant}: {reason}")]
    Inconsistency { participant: String, reason: String },

    #[error("arithmetic overflow projecting positions")]
    Overflow,
}
