use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("signing failed: {0}")]
    Signing(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),
}
