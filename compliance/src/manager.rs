use dualnet_transactions::ComplianceProof;
use dualnet_types::{PublicKey, Timestamp, TxHash};
use serde::{Deserialize, Serialize};

use crate::FreezeStatus;

/// Compliance collaborator consulted by screening and block validation.
pub trait ComplianceManager: Send + Sync {
    /// True only if the proof has not expired.
    fn validate_proof(&self, proof: &ComplianceProof) -> bool;

    fn check_freeze_status(&self, id: &PublicKey) -> FreezeStatus;

    fn is_sanctioned(&self, id: &PublicKey) -> bool;

    /// Append to the suspicious-activity log. Never fails.
    fn report_suspicious_activity(&self, tx_hash: TxHash, reason: &str);
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspiciousActivityReport {
    pub tx_hash: TxHash,
    pub reason: String,
    pub reported_at: Timestamp,
}
