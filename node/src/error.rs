use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] dualnet_ledger::LedgerError),

    #[error("mempool error: {0}")]
    Mempool(#[from] dualnet_ledger::MempoolError),

    #[error("consensus error: {0}")]
    Consensus(#[from] dualnet_consensus::ConsensusError),

    #[error("crypto error: {0}")]
    Crypto(#[from] dualnet_crypto::CryptoError),

    #[error("transaction error: {0}")]
    Transaction(#[from] dualnet_transactions::TransactionError),

    #[error("network error: {0}")]
    Network(#[from] dualnet_network::NetworkError),

    #[error("netting error: {0}")]
    Netting(#[from] dualnet_netting::NettingError),

    #[error("store error: {0}")]
    Store(#[from] dualnet_store::StoreError),

    #[error("settlement error: {0}")]
    Settlement(#[from] dualnet_settlement::SettlementError),

    #[error("shard {shard} out of range (count {count})")]
    UnknownShard { shard: u32, count: u32 },

    #[error("no signing key for validator {0}")]
    NoSigningKey(dualnet_types::ValidatorId),

    #[error("config error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("node already started")]
    AlreadyStarted,

    #[error("shutdown timeout")]
    ShutdownTimeout,
}
