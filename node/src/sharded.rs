//! The sharded, committee-based network.
//!
//! Each epoch assigns a committee per shard from the epoch seed. Every shard
//! keeps its own mempool and microblock DAG. The builder of a slot is the
//! winner of that slot's sealed-bid sequencer auction when one ran, and
//! otherwise the VRF-weighted proposer among the shard committee. Builders
//! sign their microblocks; peers authenticate a microblock against the
//! builder's registered key before anything else. Winning bids are split
//! between treasury, all active validators, pending senders and the builder.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dualnet_compliance::TransactionScreener;
use dualnet_consensus::{
    effective_stakes, select_committee, select_proposer, split_revenue, AuctionOutcome,
    Beneficiary, ConsensusError, Epoch, RevenueDistribution, RevenueSplitConfig, SequencerAuction,
    Validator, ValidatorSet,
};
use dualnet_crypto::{blake2b_256, blake2b_256_multi, Signer};
use dualnet_ledger::{BlockValidator, LedgerError, Mempool, MempoolError, MicroBlock, ShardDag};
use dualnet_network::{LocalTransport, NetworkMessage, Topic};
use dualnet_transactions::Transaction;
use dualnet_types::{
    Amount, BlockHash, Clock, ProtocolParams, PublicKey, ShardId, TxHash, ValidatorId,
};
use dualnet_vrf::SeedBeacon;
use tracing::{debug, info, warn};

use crate::NodeError;

struct ShardState {
    mempool: Mempool,
    dag: ShardDag,
    slot: u64,
    auction: Option<SequencerAuction>,
}

/// What producing one microblock did.
#[derive(Clone, Debug)]
pub struct MicroBlockOutcome {
    pub block: MicroBlock,
    pub auction: Option<AuctionOutcome>,
    pub revenue: Option<RevenueDistribution>,
}

pub struct ShardedNetwork {
    params: ProtocolParams,
    revenue: RevenueSplitConfig,
    validators: Mutex<ValidatorSet>,
    signers: Mutex<BTreeMap<ValidatorId, Arc<dyn Signer>>>,
    epoch: Mutex<Epoch>,
    shards: Vec<Mutex<ShardState>>,
    validator: BlockValidator,
    clock: Arc<dyn Clock>,
    treasury: Mutex<Amount>,
    rebates: Mutex<BTreeMap<PublicKey, Amount>>,
    transport: Option<LocalTransport>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ShardedNetwork {
    pub fn new(
        params: ProtocolParams,
        revenue: RevenueSplitConfig,
        genesis_seed: [u8; 32],
        screener: TransactionScreener,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConsensusError> {
        revenue.validate()?;
        let shards = (0..params.shard_count)
            .map(|shard| {
                Mutex::new(ShardState {
                    mempool: Mempool::new(params.mempool_capacity),
                    dag: ShardDag::new(shard),
                    slot: 0,
                    auction: None,
                })
            })
            .collect();
        Ok(Self {
            validators: Mutex::new(ValidatorSet::from_params(&params)),
            signers: Mutex::new(BTreeMap::new()),
            epoch: Mutex::new(Epoch::genesis(genesis_seed, params.shard_count)),
            shards,
            validator: BlockValidator::new(screener),
            clock,
            treasury: Mutex::new(Amount::ZERO),
            rebates: Mutex::new(BTreeMap::new()),
            transport: None,
            revenue,
            params,
        })
    }

    pub fn with_transport(mut self, transport: LocalTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn shard_count(&self) -> u32 {
        self.params.shard_count
    }

    fn shard(&self, shard: ShardId) -> Result<MutexGuard<'_, ShardState>, NodeError> {
        self.shards
            .get(shard as usize)
            .map(lock)
            .ok_or(NodeError::UnknownShard {
                shard,
                count: self.params.shard_count,
            })
    }

    pub fn register_validator(&self, id: ValidatorId, signer: Arc<dyn Signer>, stake: Amount) -> Result<(), ConsensusError> {
        lock(&self.validators).register(id.clone(), signer.public_key(), stake)?;
        lock(&self.signers).insert(id, signer);
        Ok(())
    }

    pub fn set_performance(&self, id: &ValidatorId, bps: u32) -> Result<(), ConsensusError> {
        lock(&self.validators).set_performance(id, bps)
    }

    pub fn validator(&self, id: &ValidatorId) -> Option<Validator> {
        lock(&self.validators).get(id).cloned()
    }

    /// Draw a committee for every shard from the current epoch seed.
    pub fn rotate_committees(&self) -> Result<(), ConsensusError> {
        let active = lock(&self.validators).active_snapshot();
        let mut epoch = lock(&self.epoch);
        for shard in 0..epoch.shard_count() {
            let beacon = epoch.shard_beacon(shard);
            let committee = select_committee(&beacon, &active, self.params.stake_cap_bps, self.params.committee_size)?;
            debug!(epoch = epoch.number(), shard, size = committee.len(), "committee assigned");
            epoch.set_committee(shard, committee)?;
        }
        Ok(())
    }

    pub fn epoch_number(&self) -> u64 {
        lock(&self.epoch).number()
    }

    pub fn committee(&self, shard: ShardId) -> Vec<ValidatorId> {
        lock(&self.epoch).committee(shard).to_vec()
    }

    /// Home shard of a sender: its key hash modulo the shard count.
    pub fn shard_for(&self, sender: &PublicKey) -> ShardId {
        let digest = blake2b_256(sender.as_bytes());
        let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        prefix % self.params.shard_count.max(1)
    }

    pub fn submit_transaction(&self, tx: Transaction) -> Result<(ShardId, TxHash), NodeError> {
        let shard = self.shard_for(&tx.sender);
        let mut state = self.shard(shard)?;
        if state.dag.containing_block(&tx.hash).is_some() {
            return Err(MempoolError::Duplicate(tx.hash).into());
        }
        let hash = state.mempool.try_insert(tx)?;
        debug!(tx_hash = %hash, shard, "transaction queued on sharded network");
        Ok((shard, hash))
    }

    pub fn mempool_len(&self) -> usize {
        self.shards.iter().map(|s| lock(s).mempool.len()).sum()
    }

    pub fn in_mempool(&self, tx: &TxHash) -> bool {
        self.shards.iter().any(|s| lock(s).mempool.contains(tx))
    }

    pub fn tips(&self, shard: ShardId) -> Result<Vec<BlockHash>, NodeError> {
        Ok(self.shard(shard)?.dag.tips())
    }

    pub fn microblock(&self, shard: ShardId, hash: &BlockHash) -> Result<Option<MicroBlock>, NodeError> {
        Ok(self.shard(shard)?.dag.get(hash).cloned())
    }

    /// Included in a microblock of any shard.
    pub fn is_confirmed(&self, tx: &TxHash) -> bool {
        self.shards
            .iter()
            .any(|s| lock(s).dag.containing_block(tx).is_some())
    }

    pub fn treasury(&self) -> Amount {
        *lock(&self.treasury)
    }

    pub fn rebate(&self, sender: &PublicKey) -> Amount {
        lock(&self.rebates).get(sender).copied().unwrap_or(Amount::ZERO)
    }

    // ── Sequencer auction ───────────────────────────────────────────────

    /// Open a commit phase for the shard's next slot among its committee.
    pub fn open_auction(&self, shard: ShardId) -> Result<u64, NodeError> {
        let committee = self.committee(shard);
        let mut state = self.shard(shard)?;
        let slot = state.slot;
        state.auction = Some(SequencerAuction::new(shard, slot, committee));
        Ok(slot)
    }

    pub fn commit_bid(&self, shard: ShardId, bidder: &ValidatorId, commitment: [u8; 32]) -> Result<bool, NodeError> {
        let mut state = self.shard(shard)?;
        Ok(state
            .auction
            .as_mut()
            .is_some_and(|a| a.commit(bidder, commitment)))
    }

    pub fn open_reveal(&self, shard: ShardId) -> Result<(), NodeError> {
        if let Some(auction) = self.shard(shard)?.auction.as_mut() {
            auction.open_reveal();
        }
        Ok(())
    }

    pub fn reveal_bid(&self, shard: ShardId, bidder: &ValidatorId, bid: Amount, nonce: &[u8; 32]) -> Result<bool, NodeError> {
        let mut state = self.shard(shard)?;
        Ok(state
            .auction
            .as_mut()
            .is_some_and(|a| a.reveal(bidder, bid, nonce)))
    }

    // ── Production ──────────────────────────────────────────────────────

    /// Build, validate and apply the next microblock of `shard`.
    pub fn produce_microblock(&self, shard: ShardId) -> Result<MicroBlockOutcome, NodeError> {
        let (epoch_number, committee, beacon) = {
            let epoch = lock(&self.epoch);
            (epoch.number(), epoch.committee(shard).to_vec(), epoch.shard_beacon(shard))
        };
        if committee.is_empty() {
            return Err(ConsensusError::NoActiveValidators.into());
        }
        let active = lock(&self.validators).active_snapshot();
        let members: Vec<Validator> = active
            .iter()
            .filter(|v| committee.contains(&v.id))
            .cloned()
            .collect();

        let mut state = self.shard(shard)?;
        let slot = state.slot;
        let auction = state
            .auction
            .take()
            .filter(|a| a.slot() == slot)
            .and_then(|mut a| a.close());

        let builder = match &auction {
            Some(outcome) => outcome.winner.clone(),
            None => {
                let seed = blake2b_256_multi(&[beacon.seed().as_slice(), slot.to_be_bytes().as_slice()]);
                select_proposer(&SeedBeacon::new(seed, slot), &members, self.params.stake_cap_bps)?
            }
        };
        let signer = lock(&self.signers)
            .get(&builder)
            .cloned()
            .ok_or_else(|| NodeError::NoSigningKey(builder.clone()))?;

        let pending_senders = state.mempool.pending_senders();
        let candidates = state.mempool.select_for_block(self.params.max_block_bytes);
        let mut transactions = Vec::with_capacity(candidates.len());
        for tx in candidates {
            match self.validator.screener().screen(&tx) {
                Ok(()) => transactions.push(tx),
                Err(violation) => {
                    warn!(tx_hash = %tx.hash, shard, %violation, "dropping non-compliant transaction");
                    state.mempool.remove(&tx.hash);
                }
            }
        }

        let mut block = MicroBlock::new(
            shard,
            epoch_number,
            slot,
            state.dag.tips(),
            builder,
            self.clock.now(),
            Amount::new(u128::from(self.params.block_reward)),
            transactions,
        );
        block.sign(signer.as_ref())?;
        self.accept(&mut state, block.clone())?;
        state.slot += 1;
        drop(state);

        let revenue = match &auction {
            Some(outcome) => {
                let stakes = effective_stakes(&active, self.params.stake_cap_bps);
                let distribution = split_revenue(outcome.bid, &self.revenue, &stakes, &pending_senders, &outcome.winner)?;
                self.credit(&distribution)?;
                Some(distribution)
            }
            None => None,
        };

        Ok(MicroBlockOutcome {
            block,
            auction,
            revenue,
        })
    }

    /// Authenticate, validate and apply a microblock from a peer.
    pub fn receive_microblock(&self, block: MicroBlock) -> Result<(), NodeError> {
        let mut state = self.shard(block.shard)?;
        self.accept(&mut state, block)
    }

    /// Unauthenticated blocks are dropped; any later rejection slashes the builder.
    fn accept(&self, state: &mut ShardState, block: MicroBlock) -> Result<(), NodeError> {
        let builder_key = lock(&self.validators).get(&block.builder).map(|v| v.public_key);
        self.validator
            .authenticate(&block, builder_key.as_ref())
            .map_err(LedgerError::Rejected)?;
        if state.dag.get(&block.hash).is_some() {
            return Err(LedgerError::DuplicateBlock(block.hash).into());
        }

        let verdict = self
            .validator
            .validate(&block, |p| state.dag.contains(p))
            .and_then(|()| state.dag.check_vertex(&block));
        if let Err(rejection) = verdict {
            let burned = lock(&self.validators).slash(
                &block.builder,
                &rejection.to_string(),
                Some(block.hash),
                self.clock.now(),
            );
            match burned {
                Ok(amount) => warn!(block = %block.hash, builder = %block.builder, slashed = %amount, "builder slashed"),
                Err(e) => warn!(block = %block.hash, builder = %block.builder, error = %e, "could not slash unknown builder"),
            }
            return Err(LedgerError::Rejected(rejection).into());
        }

        let included: Vec<TxHash> = block.transactions.iter().map(|tx| tx.hash).collect();
        state.dag.apply(block.clone())?;
        state.mempool.remove_included(included.iter());
        lock(&self.validators).reward(&block.builder, block.reward)?;
        info!(
            shard = block.shard,
            slot = block.slot,
            block = %block.hash,
            builder = %block.builder,
            txs = included.len(),
            "microblock accepted"
        );

        if let Some(transport) = &self.transport {
            let msg = NetworkMessage::wrap(transport.local_id(), Topic::MicroBlock, &block)?;
            transport.broadcast(&msg)?;
        }
        Ok(())
    }

    fn credit(&self, distribution: &RevenueDistribution) -> Result<(), ConsensusError> {
        for share in &distribution.shares {
            match &share.beneficiary {
                Beneficiary::Treasury => {
                    let mut treasury = lock(&self.treasury);
                    *treasury = treasury.saturating_add(share.amount);
                }
                Beneficiary::Validator(id) | Beneficiary::Proposer(id) => {
                    lock(&self.validators).reward(id, share.amount)?;
                }
                Beneficiary::Sender(sender) => {
                    let mut rebates = lock(&self.rebates);
                    let entry = rebates.entry(*sender).or_insert(Amount::ZERO);
                    *entry = entry.saturating_add(share.amount);
                }
            }
        }
        Ok(())
    }

    // ── Epochs ──────────────────────────────────────────────────────────

    /// Finalize every shard at its current state root, advance to the next
    /// epoch and draw fresh committees. Returns the closed epoch's global root.
    pub fn finalize_epoch(&self) -> Result<[u8; 32], NodeError> {
        let roots: Vec<[u8; 32]> = self.shards.iter().map(|s| lock(s).dag.state_root()).collect();
        let global_root = {
            let mut epoch = lock(&self.epoch);
            for (shard, root) in roots.into_iter().enumerate() {
                epoch.finalize_shard(shard as ShardId, root)?;
            }
            let global_root = epoch
                .global_root()
                .ok_or(ConsensusError::EpochIncomplete(epoch.number()))?;
            *epoch = epoch.advance()?;
            global_root
        };
        self.rotate_committees()?;
        info!(epoch = self.epoch_number(), "sharded network entered new epoch");
        Ok(global_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualnet_compliance::{ComplianceRegistry, StaticProofOracle};
    use dualnet_consensus::bid_commitment;
    use dualnet_crypto::{LocalSigner, Signer};
    use dualnet_transactions::TransactionBuilder;
    use dualnet_types::{SignatureAlgorithm, SystemClock, Timestamp};

    const NAMES: [&str; 4] = ["v1", "v2", "v3", "v4"];

    fn validator_key(seed: u8) -> Arc<LocalSigner> {
        Arc::new(LocalSigner::from_seed(SignatureAlgorithm::Ed25519, &[seed; 32]))
    }

    fn network() -> ShardedNetwork {
        let params = ProtocolParams {
            shard_count: 2,
            committee_size: 2,
            ..ProtocolParams::default()
        };
        let screener = TransactionScreener::new(
            Arc::new(ComplianceRegistry::default()),
            Arc::new(StaticProofOracle::default()),
            params.kyc_ceiling,
        );
        let net = ShardedNetwork::new(params, RevenueSplitConfig::default(), [7; 32], screener, Arc::new(SystemClock)).unwrap();
        for (i, name) in NAMES.iter().enumerate() {
            net.register_validator(ValidatorId::from(*name), validator_key(i as u8 + 1), Amount::new(10_000))
                .unwrap();
        }
        net.rotate_committees().unwrap();
        net
    }

    fn signed_tx(seed: u8) -> Transaction {
        let signer = LocalSigner::from_seed(SignatureAlgorithm::Ed25519, &[seed; 32]);
        TransactionBuilder::new(
            signer.public_key(),
            PublicKey::new(SignatureAlgorithm::Ed25519, [0xEE; 32]),
            Amount::new(40),
        )
        .sign(&signer)
        .unwrap()
    }

    #[test]
    fn every_shard_has_a_committee() {
        let net = network();
        for shard in 0..2 {
            assert_eq!(net.committee(shard).len(), 2);
        }
    }

    #[test]
    fn microblock_includes_shard_transactions() {
        let net = network();
        let (shard, hash) = net.submit_transaction(signed_tx(1)).unwrap();

        let outcome = net.produce_microblock(shard).unwrap();
        assert!(outcome.auction.is_none());
        assert_eq!(outcome.block.parents, vec![ShardDag::root_sentinel(shard)]);
        assert!(net.committee(shard).contains(&outcome.block.builder));
        assert!(net.is_confirmed(&hash));
        assert_eq!(net.tips(shard).unwrap(), vec![outcome.block.hash]);
    }

    #[test]
    fn auction_winner_builds_and_revenue_is_split() {
        let net = network();
        let tx = signed_tx(3);
        let sender = tx.sender;
        let (shard, _) = net.submit_transaction(tx).unwrap();
        let committee = net.committee(shard);
        let (a, b) = (&committee[0], &committee[1]);

        net.open_auction(shard).unwrap();
        assert!(net.commit_bid(shard, a, bid_commitment(Amount::new(1_000), &[1; 32])).unwrap());
        assert!(net.commit_bid(shard, b, bid_commitment(Amount::new(5_000), &[2; 32])).unwrap());
        net.open_reveal(shard).unwrap();
        assert!(net.reveal_bid(shard, a, Amount::new(1_000), &[1; 32]).unwrap());
        // Wrong nonce: the higher bid never counts.
        assert!(!net.reveal_bid(shard, b, Amount::new(5_000), &[9; 32]).unwrap());

        let outcome = net.produce_microblock(shard).unwrap();
        let auction = outcome.auction.unwrap();
        assert_eq!(&auction.winner, a);
        assert_eq!(auction.bid, Amount::new(1_000));
        assert_eq!(&outcome.block.builder, a);

        let revenue = outcome.revenue.unwrap();
        assert_eq!(revenue.sum(), Amount::new(1_000));
        assert_eq!(net.rebate(&sender), Amount::new(300));
        assert_eq!(net.treasury(), Amount::new(100));
    }

    #[test]
    fn validator_pool_covers_validators_outside_the_committee() {
        let net = network();
        let shard = 0;
        let committee = net.committee(shard);
        let outsiders: Vec<ValidatorId> = NAMES
            .iter()
            .map(|n| ValidatorId::from(*n))
            .filter(|id| !committee.contains(id))
            .collect();
        assert_eq!(outsiders.len(), 2);
        let before: Vec<Amount> = outsiders.iter().map(|id| net.validator(id).unwrap().stake).collect();

        let winner = &committee[0];
        net.open_auction(shard).unwrap();
        net.commit_bid(shard, winner, bid_commitment(Amount::new(10_000), &[5; 32])).unwrap();
        net.open_reveal(shard).unwrap();
        net.reveal_bid(shard, winner, Amount::new(10_000), &[5; 32]).unwrap();

        let revenue = net.produce_microblock(shard).unwrap().revenue.unwrap();
        // Four equal stakes share the 40% pool equally.
        for name in NAMES {
            let id = ValidatorId::from(name);
            assert_eq!(revenue.amount_for(&Beneficiary::Validator(id)), Amount::new(1_000));
        }
        for (id, stake) in outsiders.iter().zip(before) {
            assert_eq!(net.validator(id).unwrap().stake, stake.saturating_add(Amount::new(1_000)));
        }
    }

    #[test]
    fn forged_microblock_is_dropped_without_slashing() {
        let net = network();
        let shard = 1;
        let victim = net.committee(shard)[0].clone();
        let mut block = MicroBlock::new(
            shard,
            0,
            0,
            net.tips(shard).unwrap(),
            victim.clone(),
            Timestamp::EPOCH,
            Amount::ZERO,
            vec![],
        );
        block.merkle_root = [9; 32];
        block.sign(validator_key(99).as_ref()).unwrap();

        assert!(net.receive_microblock(block).is_err());
        assert!(net.validator(&victim).unwrap().slashes.is_empty());
        assert_eq!(net.tips(shard).unwrap(), vec![ShardDag::root_sentinel(shard)]);
    }

    #[test]
    fn finalizing_epoch_chains_seed_and_rotates() {
        let net = network();
        net.produce_microblock(0).unwrap();
        net.produce_microblock(1).unwrap();

        let root = net.finalize_epoch().unwrap();
        assert_ne!(root, [0u8; 32]);
        assert_eq!(net.epoch_number(), 1);
        assert_eq!(net.committee(0).len(), 2);
    }

    #[test]
    fn unknown_shard_is_an_error() {
        let net = network();
        assert!(matches!(net.produce_microblock(5), Err(NodeError::UnknownShard { .. })));
    }
}
