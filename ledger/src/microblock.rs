//! Shard microblocks: DAG vertices of the sharded network.

use dualnet_crypto::{CanonicalEncoder, CryptoError, Signer};
use dualnet_transactions::Transaction;
use dualnet_types::{Amount, BlockHash, ShardId, Signature, Timestamp, ValidatorId};
use serde::{Deserialize, Serialize};

use crate::block::{compute_merkle_root, SealedBlock};

const MICROBLOCK_DOMAIN: &[u8] = b"dualnet.microblock.v1";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroBlock {
    pub hash: BlockHash,
    pub shard: ShardId,
    pub epoch: u64,
    pub slot: u64,
    /// Current DAG tips at build time, sorted.
    pub parents: Vec<BlockHash>,
    pub builder: ValidatorId,
    pub timestamp: Timestamp,
    pub reward: Amount,
    pub merkle_root: [u8; 32],
    pub transactions: Vec<Transaction>,
    /// Builder's signature over `hash`.
    pub signature: Option<Signature>,
}

impl MicroBlock {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        shard: ShardId,
        epoch: u64,
        slot: u64,
        mut parents: Vec<BlockHash>,
        builder: ValidatorId,
        timestamp: Timestamp,
        reward: Amount,
        transactions: Vec<Transaction>,
    ) -> Self {
        parents.sort();
        parents.dedup();
        let mut block = Self {
            hash: BlockHash::ZERO,
            shard,
            epoch,
            slot,
            parents,
            builder,
            timestamp,
            reward,
            merkle_root: compute_merkle_root(&transactions),
            transactions,
            signature: None,
        };
        block.hash = block.compute_hash();
        block
    }

    pub fn sign(&mut self, signer: &dyn Signer) -> Result<(), CryptoError> {
        self.signature = Some(signer.sign(self.hash.as_bytes())?);
        Ok(())
    }
}

impl SealedBlock for MicroBlock {
    fn hash(&self) -> BlockHash {
        self.hash
    }

    fn parents(&self) -> &[BlockHash] {
        &self.parents
    }

    fn proposer(&self) -> &ValidatorId {
        &self.builder
    }

    fn merkle_root(&self) -> &[u8; 32] {
        &self.merkle_root
    }

    fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    fn compute_hash(&self) -> BlockHash {
        let mut enc = CanonicalEncoder::new(MICROBLOCK_DOMAIN);
        enc.u32(self.shard).u64(self.epoch).u64(self.slot);
        enc.u32(self.parents.len() as u32);
        for parent in &self.parents {
            enc.fixed(parent.as_bytes());
        }
        enc.str(self.builder.as_str())
            .u64(self.timestamp.as_secs())
            .u128(self.reward.raw())
            .fixed(&compute_merkle_root(&self.transactions))
            .u64(self.transactions.len() as u64);
        BlockHash::new(enc.digest())
    }
}
