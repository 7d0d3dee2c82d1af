//! Key generation for both supported signature algorithms.
//!
//! Ed25519 and Ed25519ph share the same key format; only the tag differs.

use dualnet_types::{KeyPair, PrivateKey, PublicKey, SignatureAlgorithm};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

/// Generate a new key pair from a secure random source.
pub fn generate_keypair(algorithm: SignatureAlgorithm) -> KeyPair {
    let signing_key = SigningKey::generate(&mut OsRng);
    let verifying_key = signing_key.verifying_key();
    KeyPair {
        public: PublicKey::new(algorithm, verifying_key.to_bytes()),
        private: PrivateKey {
            algorithm,
            bytes: signing_key.to_bytes(),
        },
    }
}

/// Derive the public key from a private key.
pub fn public_from_private(private: &PrivateKey) -> PublicKey {
    let signing_key = SigningKey::from_bytes(&private.bytes);
    PublicKey::new(private.algorithm, signing_key.verifying_key().to_bytes())
}

/// Reconstruct a full key pair from a private key.
pub fn keypair_from_private(private: PrivateKey) -> KeyPair {
    let public = public_from_private(&private);
    KeyPair { public, private }
}

/// Derive a key pair from a 32-byte seed (deterministic).
pub fn keypair_from_seed(algorithm: SignatureAlgorithm, seed: &[u8; 32]) -> KeyPair {
    keypair_from_private(PrivateKey {
        algorithm,
        bytes: *seed,
    })
}
