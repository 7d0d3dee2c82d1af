//! Periodic settlement worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::SettlementOrchestrator;

/// Drives recovery, processing and cleanup on a fixed interval.
pub struct SettlementWorker {
    orchestrator: Arc<SettlementOrchestrator>,
    interval: Duration,
}

impl SettlementWorker {
    pub fn new(orchestrator: Arc<SettlementOrchestrator>) -> Self {
        let interval = orchestrator.config().worker_interval();
        Self {
            orchestrator,
            interval,
        }
    }

    /// Run until `shutdown` fires. Monitors are aborted on exit.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = self.interval.as_millis() as u64, "settlement worker started");

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = ticker.tick() => self.run_cycle().await,
            }
        }

        self.orchestrator.shutdown();
        info!("settlement worker stopped");
    }

    /// One pass: re-attach monitors, settle new payments, sweep stuck ones.
    pub async fn run_cycle(&self) {
        debug!("settlement cycle");
        if let Err(e) = self.orchestrator.recover_pending_settlements() {
            error!(error = %e, "recovery pass failed");
        }
        if let Err(e) = self.orchestrator.process_pending_settlements().await {
            error!(error = %e, "settlement run failed");
        }
        if let Err(e) = self.orchestrator.cleanup_stuck_transactions() {
            error!(error = %e, "stuck payment sweep failed");
        }
    }
}
