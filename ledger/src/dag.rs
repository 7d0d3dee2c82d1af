//! Per-shard microblock DAG.
//!
//! Each shard starts from a shard-root sentinel. A microblock's parents are
//! the tips it saw; applying it removes those parents from the tip set.

use std::collections::{BTreeSet, HashMap};

use dualnet_crypto::{hash_domain, merkle_root};
use dualnet_types::{BlockHash, ShardId, TxHash};
use tracing::debug;

use crate::{BlockRejection, LedgerError, MicroBlock};

const SHARD_ROOT_DOMAIN: &[u8] = b"dualnet.shard.root";

pub struct ShardDag {
    shard: ShardId,
    root: BlockHash,
    vertices: HashMap<BlockHash, MicroBlock>,
    tips: BTreeSet<BlockHash>,
    tx_index: HashMap<TxHash, BlockHash>,
}

impl ShardDag {
    pub fn new(shard: ShardId) -> Self {
        let root = Self::root_sentinel(shard);
        Self {
            shard,
            root,
            vertices: HashMap::new(),
            tips: BTreeSet::from([root]),
            tx_index: HashMap::new(),
        }
    }

    pub fn root_sentinel(shard: ShardId) -> BlockHash {
        BlockHash::new(hash_domain(SHARD_ROOT_DOMAIN, &shard.to_be_bytes()))
    }

    pub fn shard(&self) -> ShardId {
        self.shard
    }

    pub fn contains(&self, hash: &BlockHash) -> bool {
        *hash == self.root || self.vertices.contains_key(hash)
    }

    pub fn get(&self, hash: &BlockHash) -> Option<&MicroBlock> {
        self.vertices.get(hash)
    }

    /// Current tips in sorted order; the parents for the next microblock.
    pub fn tips(&self) -> Vec<BlockHash> {
        self.tips.iter().copied().collect()
    }

    /// Shard match and no transaction included twice, in the DAG or the block.
    pub fn check_vertex(&self, block: &MicroBlock) -> Result<(), BlockRejection> {
        if block.shard != self.shard {
            return Err(BlockRejection::WrongShard {
                expected: self.shard,
                got: block.shard,
            });
        }
        let mut seen = BTreeSet::new();
        for tx in &block.transactions {
            if self.tx_index.contains_key(&tx.hash) || !seen.insert(tx.hash) {
                return Err(BlockRejection::AlreadyIncluded(tx.hash));
            }
        }
        Ok(())
    }

    pub fn apply(&mut self, block: MicroBlock) -> Result<(), LedgerError> {
        if self.vertices.contains_key(&block.hash) {
            return Err(LedgerError::DuplicateBlock(block.hash));
        }
        self.check_vertex(&block)?;
        if let Some(missing) = block.parents.iter().find(|p| !self.contains(p)) {
            return Err(LedgerError::UnknownParent(*missing));
        }
        for parent in &block.parents {
            self.tips.remove(parent);
        }
        self.tips.insert(block.hash);
        for tx in &block.transactions {
            self.tx_index.insert(tx.hash, block.hash);
        }
        debug!(shard = self.shard, block = %block.hash, tips = self.tips.len(), "microblock applied");
        self.vertices.insert(block.hash, block);
        Ok(())
    }

    pub fn containing_block(&self, tx: &TxHash) -> Option<BlockHash> {
        self.tx_index.get(tx).copied()
    }

    /// Commitment to the shard's current state: Merkle root of its tips.
    pub fn state_root(&self) -> [u8; 32] {
        let tips: Vec<[u8; 32]> = self.tips.iter().map(|h| *h.as_bytes()).collect();
        merkle_root(&tips)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}
