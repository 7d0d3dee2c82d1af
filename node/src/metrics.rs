//! Prometheus metrics for the settlement node.
//!
//! [`NodeMetrics`] owns a private [`Registry`]; [`NodeMetrics::encode`]
//! renders it in the text exposition format for whatever surface scrapes it.

use dualnet_settlement::SettlementObserver;
use dualnet_types::{SettlementId, SettlementStatus};
use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntGauge, Opts, Registry, TextEncoder,
};

pub struct NodeMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    pub blocks_produced: IntCounter,
    pub blocks_rejected: IntCounter,
    pub validators_slashed: IntCounter,
    pub settlements_submitted: IntCounter,
    pub settlements_completed: IntCounter,
    pub settlements_failed: IntCounter,
    pub payments_timed_out: IntCounter,
    pub netting_runs: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Pending transactions across both networks.
    pub mempool_depth: IntGauge,
    pub active_monitors: IntGauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, prometheus::Error> {
    register_int_counter_with_registry!(Opts::new(name, help), registry)
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGauge, prometheus::Error> {
    register_int_gauge_with_registry!(Opts::new(name, help), registry)
}

impl NodeMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        Ok(Self {
            blocks_produced: counter(&registry, "dualnet_blocks_produced_total", "Blocks and microblocks accepted after production")?,
            blocks_rejected: counter(&registry, "dualnet_blocks_rejected_total", "Blocks rejected by validation")?,
            validators_slashed: counter(&registry, "dualnet_validators_slashed_total", "Slashing events")?,
            settlements_submitted: counter(&registry, "dualnet_settlements_submitted_total", "Settlements accepted by a network")?,
            settlements_completed: counter(&registry, "dualnet_settlements_completed_total", "Settlements completed")?,
            settlements_failed: counter(&registry, "dualnet_settlements_failed_total", "Settlements failed")?,
            payments_timed_out: counter(&registry, "dualnet_payments_timed_out_total", "Payments failed by the stuck sweep")?,
            netting_runs: counter(&registry, "dualnet_netting_runs_total", "Gridlock resolution runs")?,
            mempool_depth: gauge(&registry, "dualnet_mempool_depth", "Pending transactions across both networks")?,
            active_monitors: gauge(&registry, "dualnet_active_monitors", "Live settlement confirmation monitors")?,
            registry,
        })
    }

    /// Text exposition of every metric.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl SettlementObserver for NodeMetrics {
    fn status_changed(&self, _id: SettlementId, status: SettlementStatus) {
        match status {
            SettlementStatus::Submitted => self.settlements_submitted.inc(),
            SettlementStatus::Completed => self.settlements_completed.inc(),
            SettlementStatus::Failed => self.settlements_failed.inc(),
            _ => {}
        }
    }

    fn payments_timed_out(&self, count: usize) {
        self.payments_timed_out.inc_by(count as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observer_counts_terminal_states() {
        let metrics = NodeMetrics::new().unwrap();
        let id = SettlementId::new(1);
        metrics.status_changed(id, SettlementStatus::Processing);
        metrics.status_changed(id, SettlementStatus::Submitted);
        metrics.status_changed(id, SettlementStatus::Completed);
        metrics.payments_timed_out(3);
        assert_eq!(metrics.settlements_submitted.get(), 1);
        assert_eq!(metrics.settlements_completed.get(), 1);
        assert_eq!(metrics.settlements_failed.get(), 0);
        assert_eq!(metrics.payments_timed_out.get(), 3);
    }

    #[test]
    fn encode_lists_metric_names() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.blocks_produced.inc();
        let text = metrics.encode().unwrap();
        assert!(text.contains("dualnet_blocks_produced_total 1"));
        assert!(text.contains("dualnet_active_monitors"));
    }
}
