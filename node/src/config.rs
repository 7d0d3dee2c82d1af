//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};

use dualnet_consensus::RevenueSplitConfig;
use dualnet_netting::NettingConfig;
use dualnet_settlement::SettlementConfig;
use dualnet_types::ProtocolParams;

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a settlement node.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Peer id this node registers under on the local transport.
    #[serde(default = "default_node_id")]
    pub node_id: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Hex-encoded 32-byte seed of the first sharded epoch.
    #[serde(default = "default_genesis_seed")]
    pub genesis_seed: String,

    /// Delay between block production rounds on both networks.
    #[serde(default = "default_block_interval_ms")]
    pub block_interval_ms: u64,

    /// Microblock slots per shard before the epoch is finalized.
    #[serde(default = "default_slots_per_epoch")]
    pub slots_per_epoch: u64,

    #[serde(default = "default_netting_interval_ms")]
    pub netting_interval_ms: u64,

    #[serde(default)]
    pub params: ProtocolParams,

    #[serde(default)]
    pub settlement: SettlementConfig,

    #[serde(default)]
    pub revenue: RevenueSplitConfig,

    #[serde(default)]
    pub netting: NettingConfig,
}

fn default_node_id() -> String {
    "dualnet-node".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_genesis_seed() -> String {
    "00".repeat(32)
}

fn default_block_interval_ms() -> u64 {
    1_000
}

fn default_slots_per_epoch() -> u64 {
    32
}

fn default_netting_interval_ms() -> u64 {
    5_000
}

impl NodeConfig {
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn genesis_seed_bytes(&self) -> Result<[u8; 32], NodeError> {
        let bytes = hex::decode(&self.genesis_seed)
            .map_err(|e| NodeError::Config(format!("genesis_seed: {e}")))?;
        <[u8; 32]>::try_from(bytes.as_slice())
            .map_err(|_| NodeError::Config(format!("genesis_seed must be 32 bytes, got {}", bytes.len())))
    }

    pub fn validate(&self) -> Result<(), NodeError> {
        self.params.validate().map_err(NodeError::Config)?;
        self.settlement.validate().map_err(NodeError::Config)?;
        self.revenue
            .validate()
            .map_err(|e| NodeError::Config(e.to_string()))?;
        self.genesis_seed_bytes()?;
        if self.block_interval_ms == 0 || self.netting_interval_ms == 0 {
            return Err(NodeError::Config("intervals must be non-zero".into()));
        }
        if self.slots_per_epoch == 0 {
            return Err(NodeError::Config("slots_per_epoch must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            genesis_seed: default_genesis_seed(),
            block_interval_ms: default_block_interval_ms(),
            slots_per_epoch: default_slots_per_epoch(),
            netting_interval_ms: default_netting_interval_ms(),
            params: ProtocolParams::default(),
            settlement: SettlementConfig::default(),
            revenue: RevenueSplitConfig::default(),
            netting: NettingConfig::default(),
        }
    }
}
