//! Keyed VRF built on deterministic Ed25519 signatures.
//!
//! `prove(sk, m)`: sign `H("dualnet.vrf.input" ‖ m)`; the signature is the
//! proof and `H("dualnet.vrf.output" ‖ signature)` is the output. Ed25519 and
//! Ed25519ph signing are deterministic, so the output is a function of
//! `(sk, m)` alone. Verification re-checks the signature and recomputes the
//! output.

use dualnet_crypto::{hash_domain, sign_message, verify_signature};
use dualnet_types::{KeyPair, PrivateKey, PublicKey, Signature, SignatureAlgorithm};

use crate::{RandomOutput, VrfError, VrfProvider};

const INPUT_DOMAIN: &[u8] = b"dualnet.vrf.input";
const OUTPUT_DOMAIN: &[u8] = b"dualnet.vrf.output";

/// Evaluate the VRF, returning `(output, proof)`.
pub fn vrf_prove(secret: &PrivateKey, message: &[u8]) -> Result<([u8; 32], Signature), VrfError> {
    let tagged = hash_domain(INPUT_DOMAIN, message);
    let proof = sign_message(&tagged, secret)?;
    Ok((hash_domain(OUTPUT_DOMAIN, &proof.bytes), proof))
}

/// Check a VRF `(output, proof)` pair. Never panics; malformed input is `false`.
pub fn vrf_verify(public: &PublicKey, message: &[u8], output: &[u8; 32], proof: &Signature) -> bool {
    let tagged = hash_domain(INPUT_DOMAIN, message);
    verify_signature(&tagged, proof, public) && hash_domain(OUTPUT_DOMAIN, &proof.bytes) == *output
}

fn encode_proof(proof: &Signature) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(65);
    bytes.push(match proof.algorithm {
        SignatureAlgorithm::Ed25519 => 0,
        SignatureAlgorithm::Ed25519ph => 1,
    });
    bytes.extend_from_slice(&proof.bytes);
    bytes
}

fn decode_proof(bytes: &[u8]) -> Result<Signature, VrfError> {
    let (tag, sig) = bytes
        .split_first()
        .ok_or_else(|| VrfError::InvalidProof("empty proof".into()))?;
    let algorithm = match tag {
        0 => SignatureAlgorithm::Ed25519,
        1 => SignatureAlgorithm::Ed25519ph,
        other => return Err(VrfError::InvalidProof(format!("unknown algorithm tag {other}"))),
    };
    let bytes: [u8; 64] = sig
        .try_into()
        .map_err(|_| VrfError::InvalidProof(format!("expected 64 signature bytes, got {}", sig.len())))?;
    Ok(Signature { algorithm, bytes })
}

/// A validator's own VRF.
pub struct KeyedVrf {
    keypair: KeyPair,
    round: u64,
}

impl KeyedVrf {
    pub fn new(keypair: KeyPair, round: u64) -> Self {
        Self { keypair, round }
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public
    }
}

impl VrfProvider for KeyedVrf {
    fn get_randomness(&self, context: &[u8]) -> Result<RandomOutput, VrfError> {
        let (value, proof) = vrf_prove(&self.keypair.private, context)?;
        Ok(RandomOutput {
            value,
            proof: encode_proof(&proof),
            round: self.round,
        })
    }

    fn verify(&self, context: &[u8], output: &RandomOutput) -> Result<bool, VrfError> {
        let Ok(proof) = decode_proof(&output.proof) else {
            return Ok(false);
        };
        Ok(vrf_verify(&self.keypair.public, context, &output.value, &proof))
    }

    fn name(&self) -> &str {
        "keyed-ed25519"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualnet_crypto::keypair_from_seed;

    #[test]
    fn prove_is_deterministic() {
        let kp = keypair_from_seed(SignatureAlgorithm::Ed25519, &[11u8; 32]);
        let (o1, p1) = vrf_prove(&kp.private, b"epoch-7").unwrap();
        let (o2, p2) = vrf_prove(&kp.private, b"epoch-7").unwrap();
        assert_eq!(o1, o2);
        assert_eq!(p1, p2);
    }

    #[test]
    fn prove_then_verify() {
        for alg in [SignatureAlgorithm::Ed25519, SignatureAlgorithm::Ed25519ph] {
            let kp = keypair_from_seed(alg, &[12u8; 32]);
            let (out, proof) = vrf_prove(&kp.private, b"msg").unwrap();
            assert!(vrf_verify(&kp.public, b"msg", &out, &proof));
            assert!(!vrf_verify(&kp.public, b"other", &out, &proof));
        }
    }

    #[test]
    fn tampered_output_fails() {
        let kp = keypair_from_seed(SignatureAlgorithm::Ed25519, &[13u8; 32]);
        let (mut out, proof) = vrf_prove(&kp.private, b"msg").unwrap();
        out[0] ^= 1;
        assert!(!vrf_verify(&kp.public, b"msg", &out, &proof));
    }

    #[test]
    fn provider_rejects_malformed_proof() {
        let vrf = KeyedVrf::new(keypair_from_seed(SignatureAlgorithm::Ed25519, &[14u8; 32]), 0);
        let mut out = vrf.get_randomness(b"ctx").unwrap();
        assert!(vrf.verify(b"ctx", &out).unwrap());
        out.proof.truncate(10);
        assert!(!vrf.verify(b"ctx", &out).unwrap());
        out.proof.clear();
        assert!(!vrf.verify(b"ctx", &out).unwrap());
    }
}
