//! Settlement orchestrator.
//!
//! Pending payments are grouped by currency pair into settlements, routed to
//! one of the two consensus networks through a [`NetworkConnector`], and
//! tracked to confirmation by per-settlement monitor tasks. All durable state
//! lives in the `dualnet-store` repositories, so monitors and the periodic
//! [`SettlementWorker`] can be stopped at any point and resumed by
//! [`SettlementOrchestrator::recover_pending_settlements`].

pub mod config;
pub mod connector;
pub mod error;
pub mod monitor;
pub mod orchestrator;
pub mod router;
pub mod worker;

pub use config::SettlementConfig;
pub use connector::{ConnectorError, NetworkConnector, Submission};
pub use error::SettlementError;
pub use monitor::MonitorRegistry;
pub use orchestrator::{ProcessReport, SettlementObserver, SettlementOrchestrator};
pub use router::{Connectors, Router};
pub use worker::SettlementWorker;
