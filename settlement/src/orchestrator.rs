//! Batch formation, submission and confirmation tracking.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dualnet_store::{NewSettlement, PaymentRecord, PaymentStore, Settlement, SettlementStore};
use dualnet_types::{
    Amount, Clock, CurrencyPair, PaymentId, PaymentStatus, SettlementId, SettlementStatus,
    Timestamp, TxHash,
};
use tracing::{debug, error, info, warn};

use crate::{Connectors, MonitorRegistry, Router, SettlementConfig, SettlementError};

/// Reason recorded on payments failed by the stuck-payment sweep.
pub const STUCK_PAYMENT_REASON: &str = "timed out waiting for settlement";

/// Receives settlement lifecycle events. Used for metrics.
pub trait SettlementObserver: Send + Sync {
    fn status_changed(&self, _id: SettlementId, _status: SettlementStatus) {}

    fn payments_timed_out(&self, _count: usize) {}
}

struct NoopObserver;

impl SettlementObserver for NoopObserver {}

/// What one processing run did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Submitted and now monitored.
    pub submitted: Vec<SettlementId>,
    /// Confirmed at submission time and already completed.
    pub completed: Vec<SettlementId>,
    pub failed: Vec<SettlementId>,
}

impl ProcessReport {
    pub fn is_empty(&self) -> bool {
        self.submitted.is_empty() && self.completed.is_empty() && self.failed.is_empty()
    }
}

pub struct SettlementOrchestrator {
    settlements: Arc<dyn SettlementStore>,
    payments: Arc<dyn PaymentStore>,
    connectors: Connectors,
    router: Router,
    clock: Arc<dyn Clock>,
    config: SettlementConfig,
    monitors: MonitorRegistry,
    observer: Arc<dyn SettlementObserver>,
    batch_seq: AtomicU64,
}

impl SettlementOrchestrator {
    pub fn new(
        settlements: Arc<dyn SettlementStore>,
        payments: Arc<dyn PaymentStore>,
        connectors: Connectors,
        clock: Arc<dyn Clock>,
        config: SettlementConfig,
    ) -> Self {
        Self {
            settlements,
            payments,
            connectors,
            router: Router::new(Amount::new(u128::from(config.chain_threshold))),
            clock,
            config,
            monitors: MonitorRegistry::new(),
            observer: Arc::new(NoopObserver),
            batch_seq: AtomicU64::new(0),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SettlementObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn monitors(&self) -> &MonitorRegistry {
        &self.monitors
    }

    pub fn active_monitors(&self) -> usize {
        self.monitors.active_count()
    }

    /// Batch pending payments per currency pair and submit each batch.
    ///
    /// A failure inside one group marks that settlement Failed and moves on;
    /// only repository errors outside a group abort the run.
    pub async fn process_pending_settlements(self: &Arc<Self>) -> Result<ProcessReport, SettlementError> {
        let pending = self.payments.find_pending(self.config.batch_size)?;
        let mut report = ProcessReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        let mut groups: BTreeMap<CurrencyPair, Vec<PaymentRecord>> = BTreeMap::new();
        for payment in pending {
            groups.entry(payment.currency.clone()).or_default().push(payment);
        }

        for (currency, group) in groups {
            let id = self.settle_group(currency, group, &mut report).await?;
            debug!(settlement_id = %id, "group processed");
        }

        info!(
            submitted = report.submitted.len(),
            completed = report.completed.len(),
            failed = report.failed.len(),
            "settlement run finished"
        );
        Ok(report)
    }

    async fn settle_group(
        self: &Arc<Self>,
        currency: CurrencyPair,
        group: Vec<PaymentRecord>,
        report: &mut ProcessReport,
    ) -> Result<SettlementId, SettlementError> {
        let now = self.clock.now();
        let total = group
            .iter()
            .try_fold(Amount::ZERO, |acc, p| acc.checked_add(p.amount))
            .ok_or(SettlementError::Overflow)?;
        let ids: Vec<PaymentId> = group.iter().map(|p| p.id).collect();
        let network = self.router.route(total);
        let seq = self.batch_seq.fetch_add(1, Ordering::Relaxed);

        let mut settlement = self.settlements.create_settlement(
            NewSettlement {
                batch_ref: format!("batch-{}-{}", now.as_secs(), seq),
                total,
                currency,
                network,
            },
            now,
        )?;
        settlement.payment_ids = ids.clone();
        self.advance(&mut settlement, SettlementStatus::Processing, now)?;
        info!(
            settlement_id = %settlement.id,
            currency = %settlement.currency,
            total = %total,
            network = %network,
            payments = ids.len(),
            "settlement created"
        );

        if let Err(e) = self.payments.assign_settlement(&ids, settlement.id, now) {
            error!(settlement_id = %settlement.id, error = %e, "payment association failed");
            // The assignment is all-or-nothing, so the payments stay pending.
            self.advance(&mut settlement, SettlementStatus::Failed, now)?;
            report.failed.push(settlement.id);
            return Ok(settlement.id);
        }

        let connector = self.connectors.get(network);
        settlement.submission_count += 1;
        match connector.submit_settlement(&settlement).await {
            Ok(submission) => {
                let now = self.clock.now();
                settlement.tx_hash = Some(submission.tx_hash);
                self.advance(&mut settlement, SettlementStatus::Submitted, now)?;
                info!(
                    settlement_id = %settlement.id,
                    tx_hash = %submission.tx_hash,
                    confirmed = submission.confirmed,
                    "settlement submitted"
                );
                if submission.confirmed {
                    self.complete(settlement.id)?;
                    report.completed.push(settlement.id);
                } else {
                    self.monitor_settlement(settlement.id, submission.tx_hash);
                    report.submitted.push(settlement.id);
                }
            }
            Err(e) => {
                error!(settlement_id = %settlement.id, error = %e, "submission failed");
                let now = self.clock.now();
                self.advance(&mut settlement, SettlementStatus::Failed, now)?;
                let released = self.release_payments(settlement.id, now)?;
                debug!(settlement_id = %settlement.id, released, "payments returned to the pending pool");
                report.failed.push(settlement.id);
            }
        }
        Ok(settlement.id)
    }

    /// Attach a confirmation monitor unless one is already live for `id`.
    pub fn monitor_settlement(self: &Arc<Self>, id: SettlementId, tx_hash: TxHash) -> bool {
        let this = Arc::clone(self);
        let attached = self
            .monitors
            .try_attach(id, tx_hash, move || tokio::spawn(this.run_monitor(id, tx_hash)));
        if attached {
            debug!(settlement_id = %id, tx_hash = %tx_hash, "monitor attached");
        }
        attached
    }

    async fn run_monitor(self: Arc<Self>, id: SettlementId, tx_hash: TxHash) {
        let network = match self.settlements.get_settlement(id) {
            Ok(s) => s.network,
            Err(e) => {
                error!(settlement_id = %id, error = %e, "monitor could not load settlement");
                return;
            }
        };
        let connector = Arc::clone(self.connectors.get(network));
        let interval = self.config.poll_interval();

        for attempt in 1..=self.config.max_poll_attempts {
            tokio::time::sleep(interval).await;
            match connector.check_confirmation(&tx_hash).await {
                Ok(true) => {
                    if let Err(e) = self.complete(id) {
                        error!(settlement_id = %id, error = %e, "failed to record confirmation");
                    }
                    return;
                }
                Ok(false) => debug!(settlement_id = %id, attempt, "not yet confirmed"),
                Err(e) => warn!(settlement_id = %id, attempt, error = %e, "confirmation check failed"),
            }
        }
        warn!(
            settlement_id = %id,
            tx_hash = %tx_hash,
            attempts = self.config.max_poll_attempts,
            "confirmation monitor timed out"
        );
    }

    /// Every payment Completed, then Submitted → Confirmed → Completed.
    ///
    /// Payments are written first, so an interrupted run leaves the
    /// settlement Submitted (or Confirmed) where recovery picks it up again.
    /// A settlement in any other status is left alone.
    fn complete(&self, id: SettlementId) -> Result<(), SettlementError> {
        let mut settlement = self.settlements.get_settlement(id)?;
        if !matches!(settlement.status, SettlementStatus::Submitted | SettlementStatus::Confirmed) {
            debug!(settlement_id = %id, status = %settlement.status, "confirmation ignored");
            return Ok(());
        }
        let now = self.clock.now();
        for mut payment in self.payments.find_by_settlement(id)? {
            if payment.status.is_completed() {
                continue;
            }
            payment.status = PaymentStatus::Completed;
            payment.updated_at = now;
            self.payments.update_payment(&payment)?;
        }
        if settlement.status == SettlementStatus::Submitted {
            self.advance(&mut settlement, SettlementStatus::Confirmed, now)?;
        }
        self.advance(&mut settlement, SettlementStatus::Completed, now)?;
        info!(settlement_id = %id, "settlement completed");
        Ok(())
    }

    /// Re-attach monitors to every Submitted settlement with a known hash and
    /// finish any settlement left Confirmed by an interrupted completion.
    pub fn recover_pending_settlements(self: &Arc<Self>) -> Result<usize, SettlementError> {
        for settlement in self.settlements.find_settlements_by_status(SettlementStatus::Confirmed)? {
            warn!(settlement_id = %settlement.id, "finishing interrupted completion");
            self.complete(settlement.id)?;
        }
        let mut attached = 0;
        for settlement in self.settlements.find_submitted()? {
            match settlement.tx_hash {
                Some(tx_hash) => {
                    if self.monitor_settlement(settlement.id, tx_hash) {
                        attached += 1;
                    }
                }
                None => warn!(settlement_id = %settlement.id, "submitted settlement has no tx hash"),
            }
        }
        if attached > 0 {
            info!(attached, "recovered settlement monitors");
        }
        Ok(attached)
    }

    /// Fail every payment that has been pending longer than the configured age.
    pub fn cleanup_stuck_transactions(&self) -> Result<usize, SettlementError> {
        let now = self.clock.now();
        let cutoff = now.saturating_sub_secs(self.config.stuck_after_secs);
        let stuck = self.payments.find_stuck(cutoff)?;
        for mut payment in stuck.iter().cloned() {
            payment.status = PaymentStatus::Failed(STUCK_PAYMENT_REASON.to_string());
            payment.updated_at = now;
            self.payments.update_payment(&payment)?;
            warn!(payment_id = %payment.id, created_at = %payment.created_at, "payment timed out");
        }
        if !stuck.is_empty() {
            self.observer.payments_timed_out(stuck.len());
        }
        Ok(stuck.len())
    }

    /// Close a Submitted or Confirmed settlement as Reconciled.
    pub fn reconcile_settlement(&self, id: SettlementId) -> Result<Settlement, SettlementError> {
        let mut settlement = self.settlements.get_settlement(id)?;
        if !settlement.status.can_transition_to(SettlementStatus::Reconciled) {
            return Err(SettlementError::NotReconcilable {
                id,
                status: settlement.status,
            });
        }
        self.monitors.abort(id);
        let now = self.clock.now();
        self.advance(&mut settlement, SettlementStatus::Reconciled, now)?;
        info!(settlement_id = %id, "settlement reconciled");
        Ok(settlement)
    }

    /// Wait for the monitor of `id` to finish. Returns `false` if none was attached.
    pub async fn join_monitor(&self, id: SettlementId) -> bool {
        match self.monitors.take(id) {
            Some(handle) => {
                let _ = handle.await;
                true
            }
            None => false,
        }
    }

    /// Abort every monitor. Persisted state is untouched.
    pub fn shutdown(&self) {
        self.monitors.abort_all();
    }

    fn advance(&self, settlement: &mut Settlement, next: SettlementStatus, now: Timestamp) -> Result<(), SettlementError> {
        settlement.transition(next, now)?;
        self.settlements.update_settlement(settlement)?;
        self.observer.status_changed(settlement.id, next);
        Ok(())
    }

    /// Detach the payments of a failed submission so a later run re-batches them.
    fn release_payments(&self, id: SettlementId, now: Timestamp) -> Result<usize, SettlementError> {
        let payments = self.payments.find_by_settlement(id)?;
        for mut payment in payments.iter().cloned() {
            payment.settlement_id = None;
            payment.status = PaymentStatus::Pending;
            payment.updated_at = now;
            self.payments.update_payment(&payment)?;
        }
        Ok(payments.len())
    }
}
