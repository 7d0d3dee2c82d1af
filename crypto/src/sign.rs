//! Message signing and verification.

use dualnet_types::{PrivateKey, PublicKey, Signature, SignatureAlgorithm};
use ed25519_dalek::{Signer as _, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha512};

use crate::CryptoError;

/// Context string bound into every Ed25519ph signature.
const PREHASH_CONTEXT: &[u8] = b"dualnet.ed25519ph";

fn prehash(message: &[u8]) -> Sha512 {
    let mut hasher = Sha512::new();
    hasher.update(message);
    hasher
}

/// Sign a message with a private key, returning a signature tagged with the
/// key's algorithm.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Result<Signature, CryptoError> {
    let signing_key = SigningKey::from_bytes(&private_key.bytes);
    let sig = match private_key.algorithm {
        SignatureAlgorithm::Ed25519 => signing_key.sign(message),
        SignatureAlgorithm::Ed25519ph => signing_key
            .sign_prehashed(prehash(message), Some(PREHASH_CONTEXT))
            .map_err(|e| CryptoError::Signing(e.to_string()))?,
    };
    Ok(Signature {
        algorithm: private_key.algorithm,
        bytes: sig.to_bytes(),
    })
}

/// Verify a signature against a message and public key.
///
/// Returns `false` for any malformed key, mismatched algorithm tags, or bad
/// signature. Never panics.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    if signature.algorithm != public_key.algorithm {
        return false;
    }
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.bytes) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.bytes);
    match signature.algorithm {
        SignatureAlgorithm::Ed25519 => verifying_key.verify(message, &dalek_sig).is_ok(),
        SignatureAlgorithm::Ed25519ph => verifying_key
            .verify_prehashed(prehash(message), Some(PREHASH_CONTEXT), &dalek_sig)
            .is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{generate_keypair, keypair_from_seed};

    #[test]
    fn sign_and_verify_both_algorithms() {
        for alg in [SignatureAlgorithm::Ed25519, SignatureAlgorithm::Ed25519ph] {
            let kp = generate_keypair(alg);
            let msg = b"settlement batch 42";
            let sig = sign_message(msg, &kp.private).unwrap();
            assert_eq!(sig.algorithm, alg);
            assert!(verify_signature(msg, &sig, &kp.public));
        }
    }

    #[test]
    fn wrong_message_fails() {
        let kp = generate_keypair(SignatureAlgorithm::Ed25519);
        let sig = sign_message(b"correct message", &kp.private).unwrap();
        assert!(!verify_signature(b"wrong message", &sig, &kp.public));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = generate_keypair(SignatureAlgorithm::Ed25519);
        let kp2 = generate_keypair(SignatureAlgorithm::Ed25519);
        let sig = sign_message(b"test", &kp1.private).unwrap();
        assert!(!verify_signature(b"test", &sig, &kp2.public));
    }

    #[test]
    fn mismatched_algorithm_tag_fails_closed() {
        let kp = keypair_from_seed(SignatureAlgorithm::Ed25519, &[3u8; 32]);
        let mut sig = sign_message(b"msg", &kp.private).unwrap();
        sig.algorithm = SignatureAlgorithm::Ed25519ph;
        assert!(!verify_signature(b"msg", &sig, &kp.public));
    }

    #[test]
    fn prehashed_signature_does_not_verify_as_pure() {
        let ph = keypair_from_seed(SignatureAlgorithm::Ed25519ph, &[5u8; 32]);
        let pure = keypair_from_seed(SignatureAlgorithm::Ed25519, &[5u8; 32]);
        let mut sig = sign_message(b"msg", &ph.private).unwrap();
        sig.algorithm = SignatureAlgorithm::Ed25519;
        assert!(!verify_signature(b"msg", &sig, &pure.public));
    }

    #[test]
    fn signature_deterministic() {
        let kp = keypair_from_seed(SignatureAlgorithm::Ed25519, &[99u8; 32]);
        let sig1 = sign_message(b"deterministic", &kp.private).unwrap();
        let sig2 = sign_message(b"deterministic", &kp.private).unwrap();
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn invalid_public_key() {
        let kp = generate_keypair(SignatureAlgorithm::Ed25519);
        let sig = sign_message(b"test", &kp.private).unwrap();
        let bad_key = PublicKey::new(SignatureAlgorithm::Ed25519, [0xFF; 32]);
        assert!(!verify_signature(b"test", &sig, &bad_key));
    }
}
