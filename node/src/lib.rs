//! DualNet settlement node.
//!
//! Hosts the two consensus networks side by side:
//! - a single-chain proof-of-stake network ([`ChainNetwork`])
//! - a committee-based sharded network with microblock DAGs ([`ShardedNetwork`])
//!
//! and wires them to the settlement orchestrator through connectors, next to
//! the gridlock netting engine. [`SettlementNode`] owns the background loops.

pub mod chain;
pub mod config;
pub mod connectors;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod sharded;
pub mod shutdown;

pub use chain::ChainNetwork;
pub use config::NodeConfig;
pub use connectors::{ChainConnector, LedgerConnector, SettlementLedger, ShardedConnector, SETTLEMENT_PURPOSE};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::{NodeBackends, SettlementNode};
pub use sharded::{MicroBlockOutcome, ShardedNetwork};
pub use shutdown::ShutdownController;
