use dualnet_store::StoreError;
use dualnet_types::{SettlementId, SettlementStatus};
use thiserror::Error;

use crate::ConnectorError;

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("connector error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("settlement {id} cannot be reconciled from {status}")]
    NotReconcilable {
        id: SettlementId,
        status: SettlementStatus,
    },

    #[error("settlement total overflows")]
    Overflow,
}
