use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("invalid signature on transaction {tx_hash}")]
    InvalidSignature { tx_hash: String },

    #[error("transaction {tx_hash} is not signed")]
    Unsigned { tx_hash: String },

    #[error("stored hash {stored} does not match content hash {computed}")]
    HashMismatch { stored: String, computed: String },

    #[error("invalid timestamp: {reason}")]
    InvalidTimestamp { reason: String },

    #[error("amount must be positive")]
    ZeroAmount,

    #[error("sender and receiver must be different")]
    SelfTransfer,

    #[error("gas limit must be positive")]
    ZeroGas,

    #[error("invalid payment metadata: {0}")]
    Metadata(String),

    #[error("signing failed: {0}")]
    Signing(#[from] dualnet_crypto::CryptoError),

    #[error("{0}")]
    Other(String),
}
