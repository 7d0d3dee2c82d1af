use thiserror::Error;

#[derive(Debug, Error)]
pub enum VrfError {
    #[error("invalid seed: expected 32 bytes, got {0}")]
    InvalidSeed(usize),

    #[error("invalid proof: {0}")]
    InvalidProof(String),

    #[error("proving failed: {0}")]
    Proving(#[from] dualnet_crypto::CryptoError),

    #[error("provider not available: {0}")]
    Unavailable(String),
}
