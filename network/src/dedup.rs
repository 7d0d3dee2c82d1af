//! Rolling set of recently seen envelope hashes.

use std::collections::{HashSet, VecDeque};

pub const DEFAULT_DEDUP_CAPACITY: usize = 4096;

/// Bounded first-in-first-out set of Blake2b-256 message digests.
pub struct MessageDedup {
    capacity: usize,
    hashes: HashSet<[u8; 32]>,
    order: VecDeque<[u8; 32]>,
}

impl MessageDedup {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            hashes: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Record `bytes`; returns `true` if they were already seen.
    pub fn check(&mut self, bytes: &[u8]) -> bool {
        let digest = dualnet_crypto::blake2b_256(bytes);
        if self.hashes.contains(&digest) {
            return true;
        }
        if self.hashes.len() >= self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.hashes.remove(&old);
            }
        }
        self.hashes.insert(digest);
        self.order.push_back(digest);
        false
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

impl Default for MessageDedup {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_sighting_is_duplicate() {
        let mut dedup = MessageDedup::new(8);
        assert!(!dedup.check(b"hello"));
        assert!(dedup.check(b"hello"));
        assert!(!dedup.check(b"world"));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut dedup = MessageDedup::new(2);
        dedup.check(b"1");
        dedup.check(b"2");
        dedup.check(b"3");
        assert_eq!(dedup.len(), 2);
        assert!(!dedup.check(b"1"));
        assert!(dedup.check(b"3"));
    }
}
