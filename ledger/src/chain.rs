//! Accepted-block state of the single-chain network.

use std::collections::{BTreeSet, HashMap};

use dualnet_types::{BlockHash, TxHash};
use tracing::info;

use crate::block::SealedBlock;
use crate::{Block, BlockRejection, LedgerError};

/// Blocks by hash, the current head and a transaction → block index.
/// The zero hash is the genesis sentinel at height 0.
#[derive(Default)]
pub struct ChainState {
    blocks: HashMap<BlockHash, Block>,
    head: BlockHash,
    height: u64,
    tx_index: HashMap<TxHash, BlockHash>,
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(&self) -> BlockHash {
        self.head
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    /// Known block or the genesis sentinel.
    pub fn contains(&self, hash: &BlockHash) -> bool {
        hash.is_zero() || self.blocks.contains_key(hash)
    }

    pub fn block(&self, hash: &BlockHash) -> Option<&Block> {
        self.blocks.get(hash)
    }

    /// Whether `block` extends the current head: its parent is the head, its
    /// height is one above, and none of its transactions is already on chain
    /// or repeated within the block.
    pub fn check_extends(&self, block: &Block) -> Result<(), BlockRejection> {
        if block.parent != self.head {
            return Err(BlockRejection::NotOnHead {
                head: self.head,
                parent: block.parent,
            });
        }
        let expected = self.height + 1;
        if block.height != expected {
            return Err(BlockRejection::HeightMismatch {
                expected,
                got: block.height,
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

    /// Make a validated block the new head and index its transactions.
    pub fn apply(&mut self, block: Block) -> Result<(), LedgerError> {
        if self.blocks.contains_key(&block.hash) {
            return Err(LedgerError::DuplicateBlock(block.hash));
        }
        if !self.contains(&block.parent) {
            return Err(LedgerError::UnknownParent(block.parent));
        }
        self.check_extends(&block)?;
        let hash = block.hash();
        for tx in &block.transactions {
            self.tx_index.insert(tx.hash, hash);
        }
        self.head = hash;
        self.height = block.height;
        info!(block = %hash, height = block.height, txs = block.transactions.len(), "chain head advanced");
        self.blocks.insert(hash, block);
        Ok(())
    }

    pub fn containing_block(&self, tx: &TxHash) -> Option<BlockHash> {
        self.tx_index.get(tx).copied()
    }

    /// Blocks from the containing block up to the head, inclusive.
    pub fn confirmations(&self, tx: &TxHash) -> u64 {
        self.containing_block(tx)
            .and_then(|h| self.blocks.get(&h))
            .map(|b| self.height.saturating_sub(b.height) + 1)
            .unwrap_or(0)
    }

    pub fn is_confirmed(&self, tx: &TxHash, depth: u64) -> bool {
        self.confirmations(tx) >= depth.max(1)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
