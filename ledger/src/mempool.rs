//! Fixed-capacity transaction mempool with fee-priority ordering.
//!
//! Priority is `gas_price × gas_limit`; equal priorities keep arrival order.
//! A full mempool refuses new transactions rather than evicting.

use std::collections::{BTreeMap, HashMap};

use dualnet_transactions::Transaction;
use dualnet_types::{Amount, PublicKey, TxHash};
use tracing::debug;

use crate::assembly::assemble;
use crate::MempoolError;

/// Ascending key order is descending priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct PriorityKey {
    /// `u128::MAX - priority`
    neg_priority: u128,
    insertion_order: u64,
}

impl PriorityKey {
    fn new(priority: u128, insertion_order: u64) -> Self {
        Self {
            neg_priority: u128::MAX - priority,
            insertion_order,
        }
    }
}

struct MempoolEntry {
    tx: Transaction,
    key: PriorityKey,
}

pub struct Mempool {
    capacity: usize,
    txs: HashMap<TxHash, MempoolEntry>,
    priority_index: BTreeMap<PriorityKey, TxHash>,
    insertion_counter: u64,
}

impl Mempool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            txs: HashMap::new(),
            priority_index: BTreeMap::new(),
            insertion_counter: 0,
        }
    }

    /// Insert with the reason for refusal.
    pub fn try_insert(&mut self, tx: Transaction) -> Result<TxHash, MempoolError> {
        if self.txs.len() >= self.capacity {
            return Err(MempoolError::Full {
                capacity: self.capacity,
            });
        }
        if !tx.has_valid_hash() {
            return Err(MempoolError::HashMismatch(tx.hash));
        }
        if self.txs.contains_key(&tx.hash) {
            return Err(MempoolError::Duplicate(tx.hash));
        }
        if !tx.verify_signature() {
            return Err(MempoolError::InvalidSignature(tx.hash));
        }

        let hash = tx.hash;
        let key = PriorityKey::new(tx.priority(), self.insertion_counter);
        self.insertion_counter += 1;
        self.priority_index.insert(key, hash);
        self.txs.insert(hash, MempoolEntry { tx, key });
        debug!(tx_hash = %hash, depth = self.txs.len(), "transaction admitted to mempool");
        Ok(hash)
    }

    /// Insert; `false` on any refusal, including a full pool.
    pub fn insert(&mut self, tx: Transaction) -> bool {
        self.try_insert(tx).is_ok()
    }

    pub fn remove(&mut self, hash: &TxHash) -> Option<Transaction> {
        let entry = self.txs.remove(hash)?;
        self.priority_index.remove(&entry.key);
        Some(entry.tx)
    }

    /// Drop every transaction in `hashes`; returns how many were present.
    pub fn remove_included<'a>(&mut self, hashes: impl IntoIterator<Item = &'a TxHash>) -> usize {
        hashes
            .into_iter()
            .filter(|h| self.remove(h).is_some())
            .count()
    }

    /// Transactions in descending priority order.
    pub fn iter_by_priority(&self) -> impl Iterator<Item = &Transaction> {
        self.priority_index
            .values()
            .filter_map(|hash| self.txs.get(hash).map(|e| &e.tx))
    }

    /// Greedy size-bounded selection; see [`assemble`]. Nothing is removed.
    pub fn select_for_block(&self, max_block_bytes: usize) -> Vec<Transaction> {
        assemble(self.iter_by_priority(), max_block_bytes)
    }

    /// Pending amount per sender, for the sequencer rebate.
    pub fn pending_senders(&self) -> Vec<(PublicKey, Amount)> {
        let mut by_sender: BTreeMap<PublicKey, Amount> = BTreeMap::new();
        for entry in self.txs.values() {
            let total = by_sender.entry(entry.tx.sender).or_default();
            *total = total.saturating_add(entry.tx.amount);
        }
        by_sender.into_iter().collect()
    }

    pub fn contains(&self, hash: &TxHash) -> bool {
        self.txs.contains_key(hash)
    }

    pub fn get(&self, hash: &TxHash) -> Option<&Transaction> {
        self.txs.get(hash).map(|e| &e.tx)
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualnet_crypto::{LocalSigner, Signer};
    use dualnet_transactions::TransactionBuilder;
    use dualnet_types::SignatureAlgorithm;

    fn signer() -> LocalSigner {
        LocalSigner::from_seed(SignatureAlgorithm::Ed25519, &[1; 32])
    }

    fn tx(nonce: u64, gas_price: u64) -> Transaction {
        let s = signer();
        TransactionBuilder::new(
            s.public_key(),
            PublicKey::new(SignatureAlgorithm::Ed25519, [2; 32]),
            Amount::new(10),
        )
        .nonce(nonce)
        .gas(gas_price, 100)
        .sign(&s)
        .unwrap()
    }

    #[test]
    fn capacity_enforced_without_eviction() {
        let mut pool = Mempool::new(2);
        assert!(pool.insert(tx(1, 1)));
        assert!(pool.insert(tx(2, 1)));
        // Higher priority still refused: no eviction.
        assert_eq!(pool.try_insert(tx(3, 1_000)), Err(MempoolError::Full { capacity: 2 }));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn duplicate_refused() {
        let mut pool = Mempool::new(10);
        let t = tx(1, 1);
        assert!(pool.insert(t.clone()));
        assert_eq!(pool.try_insert(t.clone()), Err(MempoolError::Duplicate(t.hash)));
    }

    #[test]
    fn tampered_and_unsigned_refused() {
        let mut pool = Mempool::new(10);
        let mut t = tx(1, 1);
        t.amount = Amount::new(99);
        assert!(matches!(pool.try_insert(t), Err(MempoolError::HashMismatch(_))));

        let unsigned = TransactionBuilder::new(
            signer().public_key(),
            PublicKey::new(SignatureAlgorithm::Ed25519, [2; 32]),
            Amount::new(1),
        )
        .build();
        assert!(matches!(pool.try_insert(unsigned), Err(MempoolError::InvalidSignature(_))));
    }

    #[test]
    fn priority_order_with_fifo_ties() {
        let mut pool = Mempool::new(10);
        let low = tx(1, 1);
        let high = tx(2, 50);
        let tie_a = tx(3, 10);
        let tie_b = tx(4, 10);
        for t in [&low, &tie_a, &high, &tie_b] {
            assert!(pool.insert(t.clone()));
        }
        let order: Vec<TxHash> = pool.iter_by_priority().map(|t| t.hash).collect();
        assert_eq!(order, vec![high.hash, tie_a.hash, tie_b.hash, low.hash]);
    }

    #[test]
    fn remove_included_frees_capacity() {
        let mut pool = Mempool::new(1);
        let t = tx(1, 1);
        pool.insert(t.clone());
        assert_eq!(pool.remove_included([&t.hash]), 1);
        assert!(pool.is_empty());
        assert!(pool.insert(tx(2, 1)));
    }

    #[test]
    fn pending_senders_aggregate() {
        let mut pool = Mempool::new(10);
        pool.insert(tx(1, 1));
        pool.insert(tx(2, 1));
        let senders = pool.pending_senders();
        assert_eq!(senders.len(), 1);
        assert_eq!(senders[0].1, Amount::new(20));
    }
}
