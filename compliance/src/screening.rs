//! Full compliance screen for a single transaction.

use std::sync::Arc;

use dualnet_transactions::Transaction;
use tracing::debug;

use crate::policy::{evaluate_script, PolicyContext};
use crate::{ComplianceManager, PolicyViolation, ProofOracle};

/// Runs, in order: sanctions on both parties, freeze direction, compliance
/// proof (if attached), privacy proof (if private), then the contract script.
/// Every failure is logged as suspicious activity before it is returned.
#[derive(Clone)]
pub struct TransactionScreener {
    manager: Arc<dyn ComplianceManager>,
    oracle: Arc<dyn ProofOracle>,
    kyc_ceiling: u8,
}

impl TransactionScreener {
    pub fn new(manager: Arc<dyn ComplianceManager>, oracle: Arc<dyn ProofOracle>, kyc_ceiling: u8) -> Self {
        Self {
            manager,
            oracle,
            kyc_ceiling,
        }
    }

    pub fn manager(&self) -> &Arc<dyn ComplianceManager> {
        &self.manager
    }

    pub fn screen(&self, tx: &Transaction) -> Result<(), PolicyViolation> {
        match self.check(tx) {
            Ok(()) => Ok(()),
            Err(violation) => {
                self.manager
                    .report_suspicious_activity(tx.hash, &violation.to_string());
                Err(violation)
            }
        }
    }

    fn check(&self, tx: &Transaction) -> Result<(), PolicyViolation> {
        let manager = self.manager.as_ref();

        if manager.is_sanctioned(&tx.sender) {
            return Err(PolicyViolation::SenderSanctioned);
        }
        if manager.is_sanctioned(&tx.receiver) {
            return Err(PolicyViolation::ReceiverSanctioned);
        }

        if !manager.check_freeze_status(&tx.sender).can_send() {
            return Err(PolicyViolation::SenderFrozen);
        }
        if !manager.check_freeze_status(&tx.receiver).can_receive() {
            return Err(PolicyViolation::ReceiverFrozen);
        }

        if let Some(proof) = &tx.compliance_proof {
            if proof.subject != tx.sender || !manager.validate_proof(proof) {
                return Err(PolicyViolation::InvalidComplianceProof);
            }
        }

        if let Some(privacy) = &tx.privacy {
            if !self.oracle.verify_privacy_proof(privacy, &tx.hash) {
                return Err(PolicyViolation::InvalidPrivacyProof);
            }
        }

        if let Some(contract) = &tx.contract {
            let ctx = PolicyContext::for_transaction(tx, manager, self.kyc_ceiling);
            evaluate_script(&contract.script, &ctx)?;
        }

        debug!(tx_hash = %tx.hash, "transaction passed screening");
        Ok(())
    }
}
