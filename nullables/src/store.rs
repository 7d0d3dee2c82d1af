//! Nullable store: in-memory settlement and payment repositories.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use dualnet_store::{NewSettlement, PaymentRecord, PaymentStore, Settlement, SettlementStore, StoreError};
use dualnet_types::{
    Amount, CurrencyPair, PaymentId, PaymentStatus, SettlementId, SettlementStatus, Timestamp,
};

#[derive(Default)]
struct State {
    next_settlement: u64,
    next_payment: u64,
    settlements: BTreeMap<SettlementId, Settlement>,
    payments: BTreeMap<PaymentId, PaymentRecord>,
    history: BTreeMap<SettlementId, Vec<SettlementStatus>>,
}

/// Thread-safe in-memory store with failure injection.
#[derive(Default)]
pub struct NullStore {
    state: Mutex<State>,
    fail_assignments: AtomicBool,
    fail_payment_updates: AtomicBool,
    unavailable: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `assign_settlement` call fail without touching payments.
    pub fn fail_assignments(&self, fail: bool) {
        self.fail_assignments.store(fail, Ordering::SeqCst);
    }

    /// Make every `update_payment` call fail; everything else keeps working.
    pub fn fail_payment_updates(&self, fail: bool) {
        self.fail_payment_updates.store(fail, Ordering::SeqCst);
    }

    /// Make every operation fail with a backend error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Insert a pending payment with the next free id.
    pub fn add_payment(&self, currency: CurrencyPair, amount: Amount, created_at: Timestamp) -> PaymentId {
        let mut state = self.lock();
        state.next_payment += 1;
        let id = PaymentId::new(state.next_payment);
        state
            .payments
            .insert(id, PaymentRecord::pending(id, currency, amount, created_at));
        id
    }

    pub fn all_settlements(&self) -> Vec<Settlement> {
        self.lock().settlements.values().cloned().collect()
    }

    pub fn all_payments(&self) -> Vec<PaymentRecord> {
        self.lock().payments.values().cloned().collect()
    }

    /// Every status a settlement has been stored with, oldest first.
    pub fn status_history(&self, id: SettlementId) -> Vec<SettlementStatus> {
        self.lock().history.get(&id).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store unavailable".into()));
        }
        Ok(())
    }
}

impl SettlementStore for NullStore {
    fn create_settlement(&self, new: NewSettlement, now: Timestamp) -> Result<Settlement, StoreError> {
        self.available()?;
        let mut state = self.lock();
        state.next_settlement += 1;
        let id = SettlementId::new(state.next_settlement);
        let settlement = Settlement::new(id, new, now);
        state.history.entry(id).or_default().push(settlement.status);
        state.settlements.insert(id, settlement.clone());
        Ok(settlement)
    }

    fn update_settlement(&self, settlement: &Settlement) -> Result<(), StoreError> {
        self.available()?;
        let mut state = self.lock();
        let Some(slot) = state.settlements.get_mut(&settlement.id) else {
            return Err(StoreError::NotFound(settlement.id.to_string()));
        };
        let changed = slot.status != settlement.status;
        *slot = settlement.clone();
        if changed {
            state.history.entry(settlement.id).or_default().push(settlement.status);
        }
        Ok(())
    }

    fn get_settlement(&self, id: SettlementId) -> Result<Settlement, StoreError> {
        self.available()?;
        self.lock()
            .settlements
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn find_settlements_by_status(&self, status: SettlementStatus) -> Result<Vec<Settlement>, StoreError> {
        self.available()?;
        Ok(self
            .lock()
            .settlements
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect())
    }
}

impl PaymentStore for NullStore {
    fn insert_payment(&self, payment: PaymentRecord) -> Result<(), StoreError> {
        self.available()?;
        let mut state = self.lock();
        if state.payments.contains_key(&payment.id) {
            return Err(StoreError::Duplicate(payment.id.to_string()));
        }
        state.next_payment = state.next_payment.max(payment.id.raw());
        state.payments.insert(payment.id, payment);
        Ok(())
    }

    fn update_payment(&self, payment: &PaymentRecord) -> Result<(), StoreError> {
        self.available()?;
        if self.fail_payment_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("payment update failed".into()));
        }
        let mut state = self.lock();
        match state.payments.get_mut(&payment.id) {
            Some(slot) => {
                *slot = payment.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(payment.id.to_string())),
        }
    }

    fn get_payment(&self, id: PaymentId) -> Result<PaymentRecord, StoreError> {
        self.available()?;
        self.lock()
            .payments
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn find_pending(&self, limit: usize) -> Result<Vec<PaymentRecord>, StoreError> {
        self.available()?;
        let state = self.lock();
        let mut pending: Vec<PaymentRecord> = state
            .payments
            .values()
            .filter(|p| p.status.is_pending() && p.settlement_id.is_none())
            .cloned()
            .collect();
        pending.sort_by_key(|p| (p.created_at, p.id));
        pending.truncate(limit);
        Ok(pending)
    }

    fn find_by_settlement(&self, id: SettlementId) -> Result<Vec<PaymentRecord>, StoreError> {
        self.available()?;
        Ok(self
            .lock()
            .payments
            .values()
            .filter(|p| p.settlement_id == Some(id))
            .cloned()
            .collect())
    }

    fn find_stuck(&self, cutoff: Timestamp) -> Result<Vec<PaymentRecord>, StoreError> {
        self.available()?;
        Ok(self
            .lock()
            .payments
            .values()
            .filter(|p| p.status.is_pending() && p.created_at < cutoff)
            .cloned()
            .collect())
    }

    fn assign_settlement(&self, ids: &[PaymentId], settlement: SettlementId, now: Timestamp) -> Result<(), StoreError> {
        self.available()?;
        if self.fail_assignments.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("assignment failed".into()));
        }
        let mut state = self.lock();
        for id in ids {
            match state.payments.get(id) {
                None => return Err(StoreError::NotFound(id.to_string())),
                Some(p) if !p.status.is_pending() || p.settlement_id.is_some() => {
                    return Err(StoreError::Conflict(format!("{id} is not assignable")));
                }
                Some(_) => {}
            }
        }
        for id in ids {
            if let Some(p) = state.payments.get_mut(id) {
                p.settlement_id = Some(settlement);
                p.status = PaymentStatus::Processing;
                p.updated_at = now;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd_eur() -> CurrencyPair {
        CurrencyPair::new("USD", "EUR")
    }

    #[test]
    fn pending_is_oldest_first_and_bounded() {
        let store = NullStore::new();
        let late = store.add_payment(usd_eur(), Amount::new(1), Timestamp::new(20));
        let early = store.add_payment(usd_eur(), Amount::new(1), Timestamp::new(10));
        store.add_payment(usd_eur(), Amount::new(1), Timestamp::new(30));

        let pending = store.find_pending(2).unwrap();
        let ids: Vec<_> = pending.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![early, late]);
    }

    #[test]
    fn assignment_is_all_or_nothing() {
        let store = NullStore::new();
        let a = store.add_payment(usd_eur(), Amount::new(1), Timestamp::new(1));
        let b = store.add_payment(usd_eur(), Amount::new(1), Timestamp::new(1));
        store.assign_settlement(&[b], SettlementId::new(9), Timestamp::new(2)).unwrap();

        let err = store
            .assign_settlement(&[a, b], SettlementId::new(10), Timestamp::new(3))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        let a = store.get_payment(a).unwrap();
        assert!(a.status.is_pending());
        assert_eq!(a.settlement_id, None);
    }

    #[test]
    fn stuck_uses_strict_cutoff() {
        let store = NullStore::new();
        store.add_payment(usd_eur(), Amount::new(1), Timestamp::new(100));
        assert!(store.find_stuck(Timestamp::new(100)).unwrap().is_empty());
        assert_eq!(store.find_stuck(Timestamp::new(101)).unwrap().len(), 1);
    }

    #[test]
    fn history_records_status_changes() {
        let store = NullStore::new();
        let mut s = store
            .create_settlement(
                NewSettlement {
                    batch_ref: "b".into(),
                    total: Amount::new(5),
                    currency: usd_eur(),
                    network: dualnet_types::NetworkKind::Sharded,
                },
                Timestamp::new(1),
            )
            .unwrap();
        s.transition(SettlementStatus::Processing, Timestamp::new(2)).unwrap();
        store.update_settlement(&s).unwrap();
        store.update_settlement(&s).unwrap();
        assert_eq!(
            store.status_history(s.id),
            vec![SettlementStatus::Pending, SettlementStatus::Processing]
        );
    }

    #[test]
    fn payment_update_failure_is_scoped() {
        let store = NullStore::new();
        let id = store.add_payment(usd_eur(), Amount::new(1), Timestamp::new(1));
        store.fail_payment_updates(true);
        let payment = store.get_payment(id).unwrap();
        assert!(matches!(store.update_payment(&payment), Err(StoreError::Backend(_))));
        assert_eq!(store.find_pending(10).unwrap().len(), 1);
    }

    #[test]
    fn unavailable_store_fails_everything() {
        let store = NullStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.find_pending(10), Err(StoreError::Backend(_))));
    }
}
