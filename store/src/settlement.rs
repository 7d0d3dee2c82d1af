//! Settlement records and their repository.

use dualnet_types::{Amount, CurrencyPair, NetworkKind, PaymentId, SettlementId, SettlementStatus, Timestamp, TxHash};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Fields supplied when a batch is formed; the store assigns the id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSettlement {
    pub batch_ref: String,
    pub total: Amount,
    pub currency: CurrencyPair,
    pub network: NetworkKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: SettlementId,
    pub batch_ref: String,
    pub total: Amount,
    pub currency: CurrencyPair,
    pub network: NetworkKind,
    pub status: SettlementStatus,
    pub tx_hash: Option<TxHash>,
    pub submission_count: u32,
    pub payment_ids: Vec<PaymentId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub submitted_at: Option<Timestamp>,
    pub confirmed_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl Settlement {
    pub fn new(id: SettlementId, new: NewSettlement, now: Timestamp) -> Self {
        Self {
            id,
            batch_ref: new.batch_ref,
            total: new.total,
            currency: new.currency,
            network: new.network,
            status: SettlementStatus::Pending,
            tx_hash: None,
            submission_count: 0,
            payment_ids: Vec::new(),
            created_at: now,
            updated_at: now,
            submitted_at: None,
            confirmed_at: None,
            completed_at: None,
        }
    }

    /// Take one legal step and stamp the matching timestamp.
    pub fn transition(&mut self, next: SettlementStatus, now: Timestamp) -> Result<(), StoreError> {
        if !self.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                id: self.id.to_string(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = now;
        match next {
            SettlementStatus::Submitted => self.submitted_at = Some(now),
            SettlementStatus::Confirmed => self.confirmed_at = Some(now),
            SettlementStatus::Completed => self.completed_at = Some(now),
            _ => {}
        }
        Ok(())
    }
}

pub trait SettlementStore: Send + Sync {
    fn create_settlement(&self, new: NewSettlement, now: Timestamp) -> Result<Settlement, StoreError>;

    /// Overwrite the stored record with the same id.
    fn update_settlement(&self, settlement: &Settlement) -> Result<(), StoreError>;

    fn get_settlement(&self, id: SettlementId) -> Result<Settlement, StoreError>;

    fn find_settlements_by_status(&self, status: SettlementStatus) -> Result<Vec<Settlement>, StoreError>;

    fn find_submitted(&self) -> Result<Vec<Settlement>, StoreError> {
        self.find_settlements_by_status(SettlementStatus::Submitted)
    }
}
