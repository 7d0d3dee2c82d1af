use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for batching, routing and monitoring.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Pending payments pulled per processing run.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Settlements whose total exceeds this go to the single-chain network.
    #[serde(default = "default_chain_threshold")]
    pub chain_threshold: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Confirmation polls before a monitor gives up.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Age after which a still-pending payment is failed.
    #[serde(default = "default_stuck_after_secs")]
    pub stuck_after_secs: u64,

    #[serde(default = "default_worker_interval_ms")]
    pub worker_interval_ms: u64,
}

fn default_batch_size() -> usize {
    100
}

fn default_chain_threshold() -> u64 {
    1_000_000
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_max_poll_attempts() -> u32 {
    30
}

fn default_stuck_after_secs() -> u64 {
    24 * 60 * 60
}

fn default_worker_interval_ms() -> u64 {
    30_000
}

impl SettlementConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn worker_interval(&self) -> Duration {
        Duration::from_millis(self.worker_interval_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be non-zero".into());
        }
        if self.max_poll_attempts == 0 {
            return Err("max_poll_attempts must be at least 1".into());
        }
        if self.poll_interval_ms == 0 || self.worker_interval_ms == 0 {
            return Err("intervals must be non-zero".into());
        }
        Ok(())
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            chain_threshold: default_chain_threshold(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            stuck_after_secs: default_stuck_after_secs(),
            worker_interval_ms: default_worker_interval_ms(),
        }
    }
}
