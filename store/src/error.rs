use dualnet_types::SettlementStatus;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("illegal transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: SettlementStatus,
        to: SettlementStatus,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}
