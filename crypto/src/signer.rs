//! Signing capability.
//!
//! Components that must sign (settlement connectors, transaction senders) hold a
//! `dyn Signer` rather than key material, so any scheme that can "sign/verify
//! over fixed-size keys" can be substituted.

use dualnet_types::{KeyPair, PublicKey, Signature, SignatureAlgorithm};

use crate::{keypair_from_seed, sign_message, CryptoError};

pub trait Signer: Send + Sync {
    /// Public half of the signing key, carrying its algorithm tag.
    fn public_key(&self) -> PublicKey;

    /// Sign an arbitrary message.
    fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError>;
}

/// A signer backed by an in-process key pair.
pub struct LocalSigner {
    keypair: KeyPair,
}

impl LocalSigner {
    pub fn new(keypair: KeyPair) -> Self {
        Self { keypair }
    }

    pub fn from_seed(algorithm: SignatureAlgorithm, seed: &[u8; 32]) -> Self {
        Self::new(keypair_from_seed(algorithm, seed))
    }
}

impl Signer for LocalSigner {
    fn public_key(&self) -> PublicKey {
        self.keypair.public
    }

    fn sign(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        sign_message(message, &self.keypair.private)
    }
}
