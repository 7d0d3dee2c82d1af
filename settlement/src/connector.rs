//! Boundary between the orchestrator and a consensus network.

use async_trait::async_trait;
use dualnet_store::Settlement;
use dualnet_types::{NetworkKind, TxHash};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    #[error("network rejected settlement: {0}")]
    Rejected(String),

    #[error("network unavailable: {0}")]
    Unavailable(String),

    #[error("unknown transaction {0}")]
    UnknownTransaction(TxHash),
}

/// Result of a successful submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Submission {
    pub tx_hash: TxHash,
    /// The network already considers the transaction final.
    pub confirmed: bool,
}

/// A consensus network that can carry settlement transactions.
#[async_trait]
pub trait NetworkConnector: Send + Sync {
    fn kind(&self) -> NetworkKind;

    async fn submit_settlement(&self, settlement: &Settlement) -> Result<Submission, ConnectorError>;

    async fn check_confirmation(&self, tx_hash: &TxHash) -> Result<bool, ConnectorError>;
}
