//! Size-bounded block assembly.

use dualnet_transactions::Transaction;

/// Take transactions in the given (priority) order while the running encoded
/// size stays within `max_block_bytes`. A transaction that does not fit is
/// skipped, not evicted, and later smaller ones may still be packed.
pub fn assemble<'a>(
    candidates: impl IntoIterator<Item = &'a Transaction>,
    max_block_bytes: usize,
) -> Vec<Transaction> {
    let mut selected = Vec::new();
    let mut used = 0usize;
    for tx in candidates {
        let size = tx.encoded_len();
        match used.checked_add(size) {
            Some(total) if total <= max_block_bytes => {
                used = total;
                selected.push(tx.clone());
            }
            _ => continue,
        }
    }
    selected
}
