//! Optional transaction extensions.

use dualnet_types::{PublicKey, Timestamp};
use serde::{Deserialize, Serialize};

/// Reference to an off-chain zero-knowledge proof for a private transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyProof {
    pub proof_ref: [u8; 32],
}

/// An issuer's attestation of a subject's KYC level, valid for a window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceProof {
    pub subject: PublicKey,
    pub kyc_level: u8,
    pub issuer: PublicKey,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl ComplianceProof {
    /// A proof is valid strictly before its expiry.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// A banking-policy script, e.g. `"REQUIRE_KYC 2; LIMIT_MAX 5000; CHECK_SANCTIONS"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRef {
    pub script: String,
}

impl ContractRef {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

/// Funds are held until `release_after`; the arbiter may release early.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowCondition {
    pub release_after: Timestamp,
    pub arbiter: Option<PublicKey>,
}

impl EscrowCondition {
    pub fn is_released(&self, now: Timestamp) -> bool {
        now >= self.release_after
    }
}
