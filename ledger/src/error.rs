use dualnet_compliance::PolicyViolation;
use dualnet_types::{BlockHash, ShardId, TxHash, ValidatorId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MempoolError {
    #[error("mempool full ({capacity} transactions)")]
    Full { capacity: usize },

    #[error("transaction {0} already in mempool")]
    Duplicate(TxHash),

    #[error("stored hash {0} does not match content")]
    HashMismatch(TxHash),

    #[error("transaction {0} has a missing or invalid signature")]
    InvalidSignature(TxHash),
}

/// Why a block was refused.
///
/// Authentication failures ([`BlockRejection::is_attributable`] is false)
/// cannot be pinned on the named proposer; every other rejection slashes it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockRejection {
    #[error("proposer {0} is not a registered validator")]
    UnknownProposer(ValidatorId),

    #[error("block carries no proposer signature")]
    MissingSignature,

    #[error("proposer signature does not verify")]
    BadSignature,

    #[error("unknown parent {0}")]
    UnknownParent(BlockHash),

    #[error("merkle root mismatch: header {header}, computed {computed}")]
    MerkleMismatch { header: String, computed: String },

    #[error("block hash mismatch: header {header}, computed {computed}")]
    HashMismatch { header: BlockHash, computed: BlockHash },

    #[error("transaction {tx_hash} failed compliance: {violation}")]
    Compliance {
        tx_hash: TxHash,
        violation: PolicyViolation,
    },

    #[error("transaction {0} has a missing or invalid signature")]
    InvalidTransactionSignature(TxHash),

    #[error("transaction {0} is already included")]
    AlreadyIncluded(TxHash),

    #[error("parent {parent} is not the head {head}")]
    NotOnHead { head: BlockHash, parent: BlockHash },

    #[error("height {got} does not follow parent height (expected {expected})")]
    HeightMismatch { expected: u64, got: u64 },

    #[error("microblock for shard {got} submitted to shard {expected}")]
    WrongShard { expected: ShardId, got: ShardId },
}

impl BlockRejection {
    /// Whether the named proposer provably produced the block.
    pub fn is_attributable(&self) -> bool {
        !matches!(self, Self::UnknownProposer(_) | Self::MissingSignature | Self::BadSignature)
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("block {0} already applied")]
    DuplicateBlock(BlockHash),

    #[error("unknown parent {0}")]
    UnknownParent(BlockHash),

    #[error("block rejected: {0}")]
    Rejected(#[from] BlockRejection),
}
