use dualnet_types::Amount;
use thiserror::Error;

/// Why a transaction failed compliance. The display string is the reason
/// recorded in the suspicious-activity log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("required KYC level {required} exceeds ceiling {ceiling}")]
    KycCeilingExceeded { required: u8, ceiling: u8 },

    #[error("amount {amount} exceeds limit {limit}")]
    LimitExceeded { amount: Amount, limit: Amount },

    #[error("sender is sanctioned")]
    SenderSanctioned,

    #[error("receiver is sanctioned")]
    ReceiverSanctioned,

    #[error("sender is frozen for sending")]
    SenderFrozen,

    #[error("receiver is frozen for receiving")]
    ReceiverFrozen,

    #[error("compliance proof is expired or invalid")]
    InvalidComplianceProof,

    #[error("privacy proof rejected")]
    InvalidPrivacyProof,

    #[error("ISO 20022 metadata with purpose code required")]
    MissingIso20022,

    #[error("malformed instruction: {0}")]
    MalformedInstruction(String),
}
