//! The single-chain proof-of-stake network.
//!
//! One proposer per height, chosen by VRF weight over capped effective stake
//! with the current head hash as seed. Produced blocks are signed with the
//! proposer's key and go through the same validation path as blocks received
//! from peers, so a proposer that packs a non-compliant transaction is
//! slashed like any other. Blocks whose signature does not verify against the
//! named proposer's registered key are dropped without slashing anyone.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dualnet_compliance::TransactionScreener;
use dualnet_consensus::{select_proposer, ConsensusError, Validator, ValidatorSet};
use dualnet_crypto::Signer;
use dualnet_ledger::{Block, BlockValidator, ChainState, LedgerError, Mempool, MempoolError};
use dualnet_network::{LocalTransport, NetworkMessage, Topic};
use dualnet_transactions::Transaction;
use dualnet_types::{Amount, BlockHash, Clock, ProtocolParams, PublicKey, TxHash, ValidatorId};
use dualnet_vrf::SeedBeacon;
use tracing::{debug, info, warn};

use crate::NodeError;

pub struct ChainNetwork {
    params: ProtocolParams,
    validators: Mutex<ValidatorSet>,
    /// Keys of the validators this node proposes for.
    signers: Mutex<BTreeMap<ValidatorId, Arc<dyn Signer>>>,
    mempool: Mutex<Mempool>,
    chain: Mutex<ChainState>,
    validator: BlockValidator,
    clock: Arc<dyn Clock>,
    transport: Option<LocalTransport>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChainNetwork {
    pub fn new(params: ProtocolParams, screener: TransactionScreener, clock: Arc<dyn Clock>) -> Self {
        Self {
            validators: Mutex::new(ValidatorSet::from_params(&params)),
            signers: Mutex::new(BTreeMap::new()),
            mempool: Mutex::new(Mempool::new(params.mempool_capacity)),
            chain: Mutex::new(ChainState::new()),
            validator: BlockValidator::new(screener),
            clock,
            transport: None,
            params,
        }
    }

    /// Gossip accepted blocks through `transport`.
    pub fn with_transport(mut self, transport: LocalTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    /// Stake a validator under the signer's public key and keep the signer
    /// for proposing.
    pub fn register_validator(&self, id: ValidatorId, signer: Arc<dyn Signer>, stake: Amount) -> Result<(), ConsensusError> {
        lock(&self.validators).register(id.clone(), signer.public_key(), stake)?;
        lock(&self.signers).insert(id, signer);
        Ok(())
    }

    pub fn delegate(&self, id: &ValidatorId, delegator: PublicKey, amount: Amount) -> Result<(), ConsensusError> {
        lock(&self.validators).delegate(id, delegator, amount)
    }

    pub fn validator(&self, id: &ValidatorId) -> Option<Validator> {
        lock(&self.validators).get(id).cloned()
    }

    pub fn submit_transaction(&self, tx: Transaction) -> Result<TxHash, MempoolError> {
        if lock(&self.chain).containing_block(&tx.hash).is_some() {
            return Err(MempoolError::Duplicate(tx.hash));
        }
        let hash = lock(&self.mempool).try_insert(tx)?;
        debug!(tx_hash = %hash, "transaction queued on chain network");
        Ok(hash)
    }

    pub fn mempool_len(&self) -> usize {
        lock(&self.mempool).len()
    }

    pub fn in_mempool(&self, tx: &TxHash) -> bool {
        lock(&self.mempool).contains(tx)
    }

    pub fn head(&self) -> BlockHash {
        lock(&self.chain).head()
    }

    pub fn height(&self) -> u64 {
        lock(&self.chain).height()
    }

    pub fn block(&self, hash: &BlockHash) -> Option<Block> {
        lock(&self.chain).block(hash).cloned()
    }

    pub fn containing_block(&self, tx: &TxHash) -> Option<BlockHash> {
        lock(&self.chain).containing_block(tx)
    }

    /// Included and buried under at least `confirmation_depth` blocks.
    pub fn is_confirmed(&self, tx: &TxHash) -> bool {
        lock(&self.chain).is_confirmed(tx, self.params.confirmation_depth)
    }

    /// Proposer for the next height, seeded by the current head.
    pub fn select_proposer(&self) -> Result<ValidatorId, ConsensusError> {
        let (head, height) = {
            let chain = lock(&self.chain);
            (chain.head(), chain.height())
        };
        let active = lock(&self.validators).active_snapshot();
        let beacon = SeedBeacon::new(*head.as_bytes(), height + 1);
        select_proposer(&beacon, &active, self.params.stake_cap_bps)
    }

    /// Build the next block from the mempool and run it through validation.
    ///
    /// Candidates that fail screening are dropped from the mempool first, so
    /// an honest proposer never packs them.
    pub fn produce_block(&self) -> Result<Block, NodeError> {
        let proposer = self.select_proposer()?;
        let signer = lock(&self.signers)
            .get(&proposer)
            .cloned()
            .ok_or_else(|| NodeError::NoSigningKey(proposer.clone()))?;
        let candidates = lock(&self.mempool).select_for_block(self.params.max_block_bytes);

        let mut transactions = Vec::with_capacity(candidates.len());
        let mut dropped = Vec::new();
        for tx in candidates {
            match self.validator.screener().screen(&tx) {
                Ok(()) => transactions.push(tx),
                Err(violation) => {
                    warn!(tx_hash = %tx.hash, %violation, "dropping non-compliant transaction");
                    dropped.push(tx.hash);
                }
            }
        }
        if !dropped.is_empty() {
            lock(&self.mempool).remove_included(dropped.iter());
        }

        let (head, height) = {
            let chain = lock(&self.chain);
            (chain.head(), chain.height())
        };
        let mut block = Block::new(
            head,
            height + 1,
            proposer,
            self.clock.now(),
            Amount::new(u128::from(self.params.block_reward)),
            transactions,
        );
        block.sign(signer.as_ref())?;
        self.receive_block(block.clone())?;
        Ok(block)
    }

    /// Authenticate, validate and apply a block.
    ///
    /// A block that fails authentication is dropped. Any later rejection
    /// slashes the proposer that signed it.
    pub fn receive_block(&self, block: Block) -> Result<(), NodeError> {
        let proposer_key = lock(&self.validators).get(&block.proposer).map(|v| v.public_key);
        self.validator
            .authenticate(&block, proposer_key.as_ref())
            .map_err(LedgerError::Rejected)?;

        let verdict = {
            let chain = lock(&self.chain);
            if chain.block(&block.hash).is_some() {
                return Err(LedgerError::DuplicateBlock(block.hash).into());
            }
            self.validator
                .validate(&block, |p| chain.contains(p))
                .and_then(|()| chain.check_extends(&block))
        };
        if let Err(rejection) = verdict {
            let burned = lock(&self.validators).slash(
                &block.proposer,
                &rejection.to_string(),
                Some(block.hash),
                self.clock.now(),
            );
            match burned {
                Ok(amount) => warn!(block = %block.hash, proposer = %block.proposer, slashed = %amount, "proposer slashed"),
                Err(e) => warn!(block = %block.hash, proposer = %block.proposer, error = %e, "could not slash unknown proposer"),
            }
            return Err(LedgerError::Rejected(rejection).into());
        }

        let included: Vec<TxHash> = block.transactions.iter().map(|tx| tx.hash).collect();
        lock(&self.chain).apply(block.clone())?;
        lock(&self.mempool).remove_included(included.iter());
        lock(&self.validators).reward(&block.proposer, block.reward)?;
        info!(block = %block.hash, height = block.height, proposer = %block.proposer, txs = included.len(), "block accepted");

        if let Some(transport) = &self.transport {
            let msg = NetworkMessage::wrap(transport.local_id(), Topic::Block, &block)?;
            transport.broadcast(&msg)?;
        }
        Ok(())
    }
}
