//! Epochs of the sharded network.
//!
//! An epoch fixes a seed and a committee per shard. Each shard finalizes
//! once with its state root; when every shard has finalized the epoch has a
//! global root and the next epoch's seed is `H(seed ‖ global_root)`.

use std::collections::BTreeMap;

use dualnet_crypto::{blake2b_256_multi, merkle_root};
use dualnet_types::{ShardId, ValidatorId};
use dualnet_vrf::SeedBeacon;
use tracing::info;

use crate::ConsensusError;

const SHARD_SEED_DOMAIN: &[u8] = b"dualnet.epoch.shard";

#[derive(Clone, Debug)]
pub struct Epoch {
    number: u64,
    seed: [u8; 32],
    shard_count: u32,
    committees: BTreeMap<ShardId, Vec<ValidatorId>>,
    shard_roots: BTreeMap<ShardId, [u8; 32]>,
}

impl Epoch {
    pub fn genesis(seed: [u8; 32], shard_count: u32) -> Self {
        Self::new(0, seed, shard_count)
    }

    pub fn new(number: u64, seed: [u8; 32], shard_count: u32) -> Self {
        Self {
            number,
            seed,
            shard_count,
            committees: BTreeMap::new(),
            shard_roots: BTreeMap::new(),
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn seed(&self) -> &[u8; 32] {
        &self.seed
    }

    pub fn shard_count(&self) -> u32 {
        self.shard_count
    }

    /// Public randomness for selection inside one shard.
    pub fn shard_beacon(&self, shard: ShardId) -> SeedBeacon {
        let seed = blake2b_256_multi(&[SHARD_SEED_DOMAIN, &self.seed, &shard.to_be_bytes()]);
        SeedBeacon::new(seed, self.number)
    }

    fn check_shard(&self, shard: ShardId) -> Result<(), ConsensusError> {
        if shard >= self.shard_count {
            return Err(ConsensusError::ShardOutOfRange {
                shard,
                count: self.shard_count,
            });
        }
        Ok(())
    }

    pub fn set_committee(&mut self, shard: ShardId, members: Vec<ValidatorId>) -> Result<(), ConsensusError> {
        self.check_shard(shard)?;
        self.committees.insert(shard, members);
        Ok(())
    }

    pub fn committee(&self, shard: ShardId) -> &[ValidatorId] {
        self.committees.get(&shard).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_member(&self, shard: ShardId, id: &ValidatorId) -> bool {
        self.committee(shard).contains(id)
    }

    /// Record a shard's final state root. Each shard finalizes once.
    pub fn finalize_shard(&mut self, shard: ShardId, root: [u8; 32]) -> Result<(), ConsensusError> {
        self.check_shard(shard)?;
        if self.shard_roots.contains_key(&shard) {
            return Err(ConsensusError::ShardAlreadyFinalized(shard));
        }
        self.shard_roots.insert(shard, root);
        info!(epoch = self.number, shard, "shard finalized");
        Ok(())
    }

    pub fn is_finalized(&self, shard: ShardId) -> bool {
        self.shard_roots.contains_key(&shard)
    }

    pub fn is_complete(&self) -> bool {
        self.shard_roots.len() as u32 == self.shard_count
    }

    /// Merkle root of shard roots in shard order, once every shard finalized.
    pub fn global_root(&self) -> Option<[u8; 32]> {
        if !self.is_complete() {
            return None;
        }
        let roots: Vec<[u8; 32]> = self.shard_roots.values().copied().collect();
        Some(merkle_root(&roots))
    }

    pub fn next_seed(&self) -> Option<[u8; 32]> {
        let root = self.global_root()?;
        Some(SeedBeacon::new(self.seed, self.number).next_seed(&root))
    }

    /// The following epoch with the chained seed and no committees.
    pub fn advance(&self) -> Result<Epoch, ConsensusError> {
        let seed = self
            .next_seed()
            .ok_or(ConsensusError::EpochIncomplete(self.number))?;
        info!(epoch = self.number + 1, "epoch advanced");
        Ok(Epoch::new(self.number + 1, seed, self.shard_count))
    }
}
