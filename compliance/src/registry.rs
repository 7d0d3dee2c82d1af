//! In-process compliance registry.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use dualnet_transactions::ComplianceProof;
use dualnet_types::{Clock, PublicKey, SystemClock, TxHash};
use tracing::{info, warn};

use crate::{ComplianceManager, FreezeStatus, SuspiciousActivityReport};

pub struct ComplianceRegistry {
    sanctioned: RwLock<HashSet<PublicKey>>,
    freezes: RwLock<HashMap<PublicKey, FreezeStatus>>,
    reports: Mutex<Vec<SuspiciousActivityReport>>,
    clock: Arc<dyn Clock>,
}

impl Default for ComplianceRegistry {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ComplianceRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sanctioned: RwLock::new(HashSet::new()),
            freezes: RwLock::new(HashMap::new()),
            reports: Mutex::new(Vec::new()),
            clock,
        }
    }

    pub fn add_sanction(&self, id: PublicKey) {
        self.sanctioned
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        info!(identity = %hex_key(&id), "identity sanctioned");
    }

    pub fn remove_sanction(&self, id: &PublicKey) -> bool {
        self.sanctioned
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Setting `Active` clears any restriction.
    pub fn set_freeze_status(&self, id: PublicKey, status: FreezeStatus) {
        let mut freezes = self.freezes.write().unwrap_or_else(PoisonError::into_inner);
        if status == FreezeStatus::Active {
            freezes.remove(&id);
        } else {
            freezes.insert(id, status);
        }
        info!(identity = %hex_key(&id), ?status, "freeze status updated");
    }

    /// Snapshot of the suspicious-activity log in report order.
    pub fn reports(&self) -> Vec<SuspiciousActivityReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn report_count(&self) -> usize {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ComplianceManager for ComplianceRegistry {
    fn validate_proof(&self, proof: &ComplianceProof) -> bool {
        !proof.is_expired(self.clock.now())
    }

    fn check_freeze_status(&self, id: &PublicKey) -> FreezeStatus {
        self.freezes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .copied()
            .unwrap_or_default()
    }

    fn is_sanctioned(&self, id: &PublicKey) -> bool {
        self.sanctioned
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    fn report_suspicious_activity(&self, tx_hash: TxHash, reason: &str) {
        warn!(tx_hash = %tx_hash, reason, "suspicious activity reported");
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SuspiciousActivityReport {
                tx_hash,
                reason: reason.to_string(),
                reported_at: self.clock.now(),
            });
    }
}

fn hex_key(key: &PublicKey) -> String {
    hex::encode(&key.bytes[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualnet_types::{SignatureAlgorithm, Timestamp};

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0)
        }
    }

    fn key(b: u8) -> PublicKey {
        PublicKey::new(SignatureAlgorithm::Ed25519, [b; 32])
    }

    fn proof(expires_at: u64) -> ComplianceProof {
        ComplianceProof {
            subject: key(1),
            kyc_level: 2,
            issuer: key(9),
            issued_at: Timestamp::new(0),
            expires_at: Timestamp::new(expires_at),
        }
    }

    #[test]
    fn proof_expiry() {
        let registry = ComplianceRegistry::new(Arc::new(FixedClock(100)));
        assert!(registry.validate_proof(&proof(101)));
        assert!(!registry.validate_proof(&proof(100)));
        assert!(!registry.validate_proof(&proof(50)));
    }

    #[test]
    fn sanctions_add_remove() {
        let registry = ComplianceRegistry::default();
        assert!(!registry.is_sanctioned(&key(1)));
        registry.add_sanction(key(1));
        assert!(registry.is_sanctioned(&key(1)));
        assert!(registry.remove_sanction(&key(1)));
        assert!(!registry.is_sanctioned(&key(1)));
    }

    #[test]
    fn freeze_defaults_to_active() {
        let registry = ComplianceRegistry::default();
        assert_eq!(registry.check_freeze_status(&key(2)), FreezeStatus::Active);
        registry.set_freeze_status(key(2), FreezeStatus::ReceiveOnly);
        assert_eq!(registry.check_freeze_status(&key(2)), FreezeStatus::ReceiveOnly);
        registry.set_freeze_status(key(2), FreezeStatus::Active);
        assert_eq!(registry.check_freeze_status(&key(2)), FreezeStatus::Active);
    }

    #[test]
    fn reports_append_in_order() {
        let registry = ComplianceRegistry::new(Arc::new(FixedClock(7)));
        registry.report_suspicious_activity(TxHash::new([1; 32]), "first");
        registry.report_suspicious_activity(TxHash::new([2; 32]), "second");
        let reports = registry.reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].reason, "first");
        assert_eq!(reports[1].reported_at, Timestamp::new(7));
    }

    #[test]
    fn log_identity_is_key_prefix() {
        assert_eq!(hex_key(&key(0xAB)), "abababababababab");
    }
}
