//! The settlement node: both networks, their connectors, the settlement
//! worker and the netting engine, driven by background loops.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use dualnet_compliance::{ComplianceManager, ProofOracle, TransactionScreener};
use dualnet_consensus::ConsensusError;
use dualnet_crypto::Signer;
use dualnet_ledger::LedgerError;
use dualnet_netting::{NettingEngine, NettingError, Resolution};
use dualnet_network::{LocalTransport, PeerRegistry};
use dualnet_settlement::{Connectors, SettlementOrchestrator, SettlementWorker};
use dualnet_store::{PaymentStore, SettlementStore};
use dualnet_types::{Amount, Clock, PublicKey, ValidatorId};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::connectors::{ChainConnector, ShardedConnector};
use crate::{ChainNetwork, NodeConfig, NodeError, NodeMetrics, ShardedNetwork, ShutdownController};

/// How long `stop` waits for each background task.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// External collaborators a node is built from.
pub struct NodeBackends {
    pub settlements: Arc<dyn SettlementStore>,
    pub payments: Arc<dyn PaymentStore>,
    pub compliance: Arc<dyn ComplianceManager>,
    pub proofs: Arc<dyn ProofOracle>,
    pub clock: Arc<dyn Clock>,
    /// Key that signs settlement transfers on both networks.
    pub signer: Arc<dyn Signer>,
    /// Receiver of every settlement transfer.
    pub clearing_account: PublicKey,
    /// Gossip accepted blocks to these peers when set.
    pub peers: Option<Arc<PeerRegistry>>,
}

pub struct SettlementNode {
    config: NodeConfig,
    chain: Arc<ChainNetwork>,
    sharded: Arc<ShardedNetwork>,
    orchestrator: Arc<SettlementOrchestrator>,
    netting: Arc<NettingEngine>,
    metrics: Arc<NodeMetrics>,
    shutdown: ShutdownController,
    handles: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
    round: AtomicU64,
}

impl SettlementNode {
    pub fn new(config: NodeConfig, backends: NodeBackends) -> Result<Self, NodeError> {
        config.validate()?;
        let screener = TransactionScreener::new(backends.compliance, backends.proofs, config.params.kyc_ceiling);

        let mut chain = ChainNetwork::new(config.params.clone(), screener.clone(), Arc::clone(&backends.clock));
        let mut sharded = ShardedNetwork::new(
            config.params.clone(),
            config.revenue.clone(),
            config.genesis_seed_bytes()?,
            screener,
            Arc::clone(&backends.clock),
        )?;
        if let Some(peers) = backends.peers {
            let transport = LocalTransport::new(config.node_id.clone(), peers);
            chain = chain.with_transport(transport.clone());
            sharded = sharded.with_transport(transport);
        }
        let chain = Arc::new(chain);
        let sharded = Arc::new(sharded);

        let connectors = Connectors::new(
            Arc::new(ShardedConnector::new(
                Arc::clone(&sharded),
                Arc::clone(&backends.signer),
                backends.clearing_account,
                Arc::clone(&backends.clock),
            )),
            Arc::new(ChainConnector::new(
                Arc::clone(&chain),
                backends.signer,
                backends.clearing_account,
                Arc::clone(&backends.clock),
            )),
        );

        let metrics = Arc::new(NodeMetrics::new()?);
        let orchestrator = SettlementOrchestrator::new(
            backends.settlements,
            backends.payments,
            connectors,
            backends.clock,
            config.settlement.clone(),
        )
        .with_observer(metrics.clone());

        Ok(Self {
            chain,
            sharded,
            orchestrator: Arc::new(orchestrator),
            netting: Arc::new(NettingEngine::new(config.netting.clone())),
            metrics,
            shutdown: ShutdownController::new(),
            handles: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
            round: AtomicU64::new(0),
            config,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn chain(&self) -> &Arc<ChainNetwork> {
        &self.chain
    }

    pub fn sharded(&self) -> &Arc<ShardedNetwork> {
        &self.sharded
    }

    pub fn orchestrator(&self) -> &Arc<SettlementOrchestrator> {
        &self.orchestrator
    }

    pub fn netting(&self) -> &Arc<NettingEngine> {
        &self.netting
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.metrics
    }

    /// Stake a validator on both networks; `signer` signs the blocks it proposes.
    pub fn register_validator(&self, id: ValidatorId, signer: Arc<dyn Signer>, stake: Amount) -> Result<(), ConsensusError> {
        self.chain.register_validator(id.clone(), Arc::clone(&signer), stake)?;
        self.sharded.register_validator(id, signer, stake)
    }

    /// Draw the first committees and spawn every background loop.
    pub fn start(self: &Arc<Self>) -> Result<(), NodeError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(NodeError::AlreadyStarted);
        }
        self.sharded.rotate_committees()?;

        let worker = SettlementWorker::new(Arc::clone(&self.orchestrator));
        let worker_handle = tokio::spawn(worker.run(self.shutdown.subscribe()));

        let node = Arc::clone(self);
        let production_handle = tokio::spawn(node.production_loop(self.shutdown.subscribe()));

        let node = Arc::clone(self);
        let netting_handle = tokio::spawn(node.netting_loop(self.shutdown.subscribe()));

        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend([worker_handle, production_handle, netting_handle]);
        info!(node_id = %self.config.node_id, shards = self.sharded.shard_count(), "settlement node started");
        Ok(())
    }

    /// Signal every loop, abort monitors and wait for the tasks to exit.
    pub async fn stop(&self) -> Result<(), NodeError> {
        info!(node_id = %self.config.node_id, "settlement node stopping");
        self.shutdown.shutdown();
        self.orchestrator.shutdown();

        let handles: Vec<JoinHandle<()>> = self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in handles {
            if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
                error!("background task did not stop in time");
                return Err(NodeError::ShutdownTimeout);
            }
        }
        info!("settlement node stopped");
        Ok(())
    }

    /// Run the node until SIGINT or SIGTERM.
    pub async fn run_until_signal(self: &Arc<Self>) -> Result<(), NodeError> {
        self.start()?;
        self.shutdown.wait_for_signal().await;
        self.stop().await
    }

    async fn production_loop(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.block_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = ticker.tick() => self.produce_round(),
            }
        }
        debug!("block production stopped");
    }

    async fn netting_loop(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.netting_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    if self.netting.queue_len() > 0 {
                        if let Err(e) = self.run_netting() {
                            warn!(error = %e, "netting run failed");
                        }
                    }
                }
            }
        }
        debug!("netting loop stopped");
    }

    /// One production round: a chain block, a microblock on every shard,
    /// and an epoch change once `slots_per_epoch` rounds have passed.
    pub fn produce_round(&self) {
        match self.chain.produce_block() {
            Ok(_) => self.metrics.blocks_produced.inc(),
            Err(e) => self.record_production_error("chain", &e),
        }
        for shard in 0..self.sharded.shard_count() {
            match self.sharded.produce_microblock(shard) {
                Ok(_) => self.metrics.blocks_produced.inc(),
                Err(e) => self.record_production_error("sharded", &e),
            }
        }

        let round = self.round.fetch_add(1, Ordering::Relaxed) + 1;
        if round % self.config.slots_per_epoch == 0 {
            match self.sharded.finalize_epoch() {
                Ok(root) => info!(epoch = self.sharded.epoch_number(), global_root = %hex::encode(root), "epoch finalized"),
                Err(e) => error!(error = %e, "epoch finalization failed"),
            }
        }

        let depth = self.chain.mempool_len() + self.sharded.mempool_len();
        self.metrics.mempool_depth.set(depth as i64);
        self.metrics.active_monitors.set(self.orchestrator.active_monitors() as i64);
    }

    fn record_production_error(&self, network: &str, e: &NodeError) {
        match e {
            NodeError::Ledger(LedgerError::Rejected(_)) => {
                self.metrics.blocks_rejected.inc();
                self.metrics.validators_slashed.inc();
            }
            // Nothing staked yet.
            NodeError::Consensus(ConsensusError::NoActiveValidators) => {
                debug!(network, "no active validators, skipping production");
                return;
            }
            _ => {}
        }
        warn!(network, error = %e, "block production failed");
    }

    /// Resolve the netting queue once.
    pub fn run_netting(&self) -> Result<Resolution, NettingError> {
        self.metrics.netting_runs.inc();
        let resolution = self.netting.resolve()?;
        info!(
            cleared = resolution.cleared.len(),
            deferred = resolution.deferred.len(),
            "netting run finished"
        );
        Ok(resolution)
    }
}
