//! Supervision of confirmation monitors, keyed by settlement.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use dualnet_types::{SettlementId, TxHash};
use tokio::task::JoinHandle;

struct MonitorEntry {
    tx_hash: TxHash,
    handle: JoinHandle<()>,
}

/// At most one live monitor task per settlement.
#[derive(Default)]
pub struct MonitorRegistry {
    entries: Mutex<HashMap<SettlementId, MonitorEntry>>,
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a monitor for `id` unless a live one already exists.
    ///
    /// `spawn` runs under the registry lock, so two concurrent callers can
    /// never both attach.
    pub fn try_attach<F>(&self, id: SettlementId, tx_hash: TxHash, spawn: F) -> bool
    where
        F: FnOnce() -> JoinHandle<()>,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, entry| !entry.handle.is_finished());
        if entries.contains_key(&id) {
            return false;
        }
        entries.insert(
            id,
            MonitorEntry {
                tx_hash,
                handle: spawn(),
            },
        );
        true
    }

    pub fn is_active(&self, id: SettlementId) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .is_some_and(|entry| !entry.handle.is_finished())
    }

    /// Transaction hash the live monitor for `id` is polling.
    pub fn tx_hash(&self, id: SettlementId) -> Option<TxHash> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .filter(|entry| !entry.handle.is_finished())
            .map(|entry| entry.tx_hash)
    }

    /// Detach the monitor for `id`, handing its task to the caller.
    pub fn take(&self, id: SettlementId) -> Option<JoinHandle<()>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .map(|entry| entry.handle)
    }

    pub fn abort(&self, id: SettlementId) {
        if let Some(handle) = self.take(id) {
            handle.abort();
        }
    }

    pub fn abort_all(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, entry) in entries.drain() {
            entry.handle.abort();
        }
    }

    pub fn active_count(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, entry| !entry.handle.is_finished());
        entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future;

    fn hash(b: u8) -> TxHash {
        TxHash::new([b; 32])
    }

    #[tokio::test]
    async fn second_attach_is_refused_while_live() {
        let registry = MonitorRegistry::new();
        let id = SettlementId::new(1);
        assert!(registry.try_attach(id, hash(1), || tokio::spawn(future::pending())));
        assert!(!registry.try_attach(id, hash(1), || tokio::spawn(future::pending())));
        assert_eq!(registry.tx_hash(id), Some(hash(1)));
        assert_eq!(registry.active_count(), 1);
        registry.abort_all();
        assert_eq!(registry.active_count(), 0);
    }

    #[tokio::test]
    async fn finished_monitor_is_replaced() {
        let registry = MonitorRegistry::new();
        let id = SettlementId::new(7);
        assert!(registry.try_attach(id, hash(1), || tokio::spawn(async {})));
        // Wait for the first task to finish, then re-attach.
        while registry.is_active(id) {
            tokio::task::yield_now().await;
        }
        assert!(registry.try_attach(id, hash(2), || tokio::spawn(future::pending())));
        assert_eq!(registry.tx_hash(id), Some(hash(2)));
        registry.abort(id);
        assert!(!registry.is_active(id));
    }
}
