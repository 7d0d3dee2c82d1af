//! Zero-knowledge proof verification seam.
//!
//! Proof soundness is outside the system; the oracle only answers yes or no.

use dualnet_transactions::PrivacyProof;
use dualnet_types::TxHash;

pub trait ProofOracle: Send + Sync {
    fn verify_privacy_proof(&self, proof: &PrivacyProof, tx_hash: &TxHash) -> bool;
}

/// Oracle returning a fixed verdict.
#[derive(Clone, Copy, Debug)]
pub struct StaticProofOracle(pub bool);

impl Default for StaticProofOracle {
    fn default() -> Self {
        Self(true)
    }
}

impl ProofOracle for StaticProofOracle {
    fn verify_privacy_proof(&self, _proof: &PrivacyProof, _tx_hash: &TxHash) -> bool {
        self.0
    }
}
