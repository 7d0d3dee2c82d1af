//! Payment records: the orchestrator's unit of pending work.

use dualnet_types::{Amount, CurrencyPair, PaymentId, PaymentStatus, SettlementId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::StoreError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub currency: CurrencyPair,
    pub amount: Amount,
    pub status: PaymentStatus,
    pub settlement_id: Option<SettlementId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PaymentRecord {
    pub fn pending(id: PaymentId, currency: CurrencyPair, amount: Amount, now: Timestamp) -> Self {
        Self {
            id,
            currency,
            amount,
            status: PaymentStatus::Pending,
            settlement_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

pub trait PaymentStore: Send + Sync {
    fn insert_payment(&self, payment: PaymentRecord) -> Result<(), StoreError>;

    fn update_payment(&self, payment: &PaymentRecord) -> Result<(), StoreError>;

    fn get_payment(&self, id: PaymentId) -> Result<PaymentRecord, StoreError>;

    /// Up to `limit` pending, unassigned payments, oldest first.
    fn find_pending(&self, limit: usize) -> Result<Vec<PaymentRecord>, StoreError>;

    fn find_by_settlement(&self, id: SettlementId) -> Result<Vec<PaymentRecord>, StoreError>;

    /// Payments still pending that were created before `cutoff`.
    fn find_stuck(&self, cutoff: Timestamp) -> Result<Vec<PaymentRecord>, StoreError>;

    /// Atomically attach `settlement` to every payment in `ids` and mark them
    /// Processing. Either every payment is updated or none is.
    fn assign_settlement(&self, ids: &[PaymentId], settlement: SettlementId, now: Timestamp) -> Result<(), StoreError>;
}
