//! Settlement connectors backed by the in-process networks.
//!
//! A settlement becomes one signed transfer of the batch total from the
//! node's settlement key to the clearing account. The nonce is derived from
//! the settlement id and its submission count, so a resubmission never
//! collides with an earlier attempt in the mempool.

use std::sync::Arc;

use async_trait::async_trait;
use dualnet_crypto::Signer;
use dualnet_settlement::{ConnectorError, NetworkConnector, Submission};
use dualnet_store::Settlement;
use dualnet_transactions::{PaymentMetadata, Transaction, TransactionBuilder};
use dualnet_types::{Clock, NetworkKind, PublicKey, TxHash};
use tracing::debug;

use crate::{ChainNetwork, NodeError, ShardedNetwork};

/// ISO 20022 purpose code carried by settlement transfers.
pub const SETTLEMENT_PURPOSE: &str = "TREA";

/// What a connector needs from a network.
pub trait SettlementLedger: Send + Sync {
    const KIND: NetworkKind;

    fn submit(&self, tx: Transaction) -> Result<TxHash, NodeError>;

    fn is_confirmed(&self, tx: &TxHash) -> bool;

    /// Accepted but not yet final.
    fn is_pending(&self, tx: &TxHash) -> bool;
}

impl SettlementLedger for ChainNetwork {
    const KIND: NetworkKind = NetworkKind::Chain;

    fn submit(&self, tx: Transaction) -> Result<TxHash, NodeError> {
        Ok(self.submit_transaction(tx)?)
    }

    fn is_confirmed(&self, tx: &TxHash) -> bool {
        ChainNetwork::is_confirmed(self, tx)
    }

    fn is_pending(&self, tx: &TxHash) -> bool {
        self.in_mempool(tx) || self.containing_block(tx).is_some()
    }
}

impl SettlementLedger for ShardedNetwork {
    const KIND: NetworkKind = NetworkKind::Sharded;

    fn submit(&self, tx: Transaction) -> Result<TxHash, NodeError> {
        self.submit_transaction(tx).map(|(_, hash)| hash)
    }

    fn is_confirmed(&self, tx: &TxHash) -> bool {
        ShardedNetwork::is_confirmed(self, tx)
    }

    fn is_pending(&self, tx: &TxHash) -> bool {
        self.in_mempool(tx)
    }
}

pub struct LedgerConnector<L> {
    ledger: Arc<L>,
    signer: Arc<dyn Signer>,
    clearing_account: PublicKey,
    clock: Arc<dyn Clock>,
}

pub type ChainConnector = LedgerConnector<ChainNetwork>;
pub type ShardedConnector = LedgerConnector<ShardedNetwork>;

impl<L: SettlementLedger> LedgerConnector<L> {
    pub fn new(ledger: Arc<L>, signer: Arc<dyn Signer>, clearing_account: PublicKey, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger,
            signer,
            clearing_account,
            clock,
        }
    }

    fn settlement_transaction(&self, settlement: &Settlement) -> Result<Transaction, ConnectorError> {
        let nonce = (settlement.id.raw() << 16) | u64::from(settlement.submission_count & 0xFFFF);
        let mut metadata = PaymentMetadata::with_purpose(SETTLEMENT_PURPOSE);
        metadata.remittance_info = Some(format!("{} {}", settlement.batch_ref, settlement.currency));
        TransactionBuilder::new(self.signer.public_key(), self.clearing_account, settlement.total)
            .nonce(nonce)
            .timestamp(self.clock.now())
            .metadata(metadata)
            .sign(self.signer.as_ref())
            .map_err(|e| ConnectorError::Rejected(e.to_string()))
    }
}

#[async_trait]
impl<L: SettlementLedger + 'static> NetworkConnector for LedgerConnector<L> {
    fn kind(&self) -> NetworkKind {
        L::KIND
    }

    async fn submit_settlement(&self, settlement: &Settlement) -> Result<Submission, ConnectorError> {
        let tx = self.settlement_transaction(settlement)?;
        let tx_hash = self.ledger.submit(tx).map_err(|e| match e {
            NodeError::Mempool(e) => ConnectorError::Rejected(e.to_string()),
            other => ConnectorError::Unavailable(other.to_string()),
        })?;
        let network = L::KIND;
        debug!(settlement_id = %settlement.id, %tx_hash, %network, "settlement transaction queued");
        Ok(Submission {
            tx_hash,
            confirmed: false,
        })
    }

    async fn check_confirmation(&self, tx_hash: &TxHash) -> Result<bool, ConnectorError> {
        if self.ledger.is_confirmed(tx_hash) {
            return Ok(true);
        }
        if self.ledger.is_pending(tx_hash) {
            return Ok(false);
        }
        Err(ConnectorError::UnknownTransaction(*tx_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualnet_compliance::{ComplianceRegistry, StaticProofOracle, TransactionScreener};
    use dualnet_crypto::LocalSigner;
    use dualnet_nullables::NullClock;
    use dualnet_store::NewSettlement;
    use dualnet_types::{
        Amount, CurrencyPair, ProtocolParams, SettlementId, SignatureAlgorithm, SystemClock, Timestamp,
        ValidatorId,
    };

    fn chain() -> Arc<ChainNetwork> {
        let params = ProtocolParams::default();
        let screener = TransactionScreener::new(
            Arc::new(ComplianceRegistry::default()),
            Arc::new(StaticProofOracle::default()),
            params.kyc_ceiling,
        );
        let net = ChainNetwork::new(params, screener, Arc::new(SystemClock));
        net.register_validator(
            ValidatorId::from("solo"),
            Arc::new(LocalSigner::from_seed(SignatureAlgorithm::Ed25519, &[1; 32])),
            Amount::new(10_000),
        )
        .unwrap();
        Arc::new(net)
    }

    fn connector(net: Arc<ChainNetwork>) -> ChainConnector {
        let signer = Arc::new(LocalSigner::from_seed(SignatureAlgorithm::Ed25519, &[42; 32]));
        ChainConnector::new(
            net,
            signer,
            PublicKey::new(SignatureAlgorithm::Ed25519, [0xCC; 32]),
            Arc::new(NullClock::new(1_000)),
        )
    }

    fn settlement(id: u64) -> Settlement {
        Settlement::new(
            SettlementId::new(id),
            NewSettlement {
                batch_ref: format!("batch-{id}"),
                total: Amount::new(2_500),
                currency: CurrencyPair::new("EUR", "USD"),
                network: NetworkKind::Chain,
            },
            Timestamp::new(1),
        )
    }

    #[tokio::test]
    async fn submission_confirms_once_included() {
        let net = chain();
        let connector = connector(net.clone());
        let submission = connector.submit_settlement(&settlement(1)).await.unwrap();
        assert!(!submission.confirmed);
        assert_eq!(connector.check_confirmation(&submission.tx_hash).await, Ok(false));

        net.produce_block().unwrap();
        assert_eq!(connector.check_confirmation(&submission.tx_hash).await, Ok(true));
    }

    #[tokio::test]
    async fn resubmission_uses_fresh_nonce() {
        let connector = connector(chain());
        let mut s = settlement(2);
        let first = connector.submit_settlement(&s).await.unwrap();
        assert!(matches!(
            connector.submit_settlement(&s).await,
            Err(ConnectorError::Rejected(_))
        ));
        s.submission_count += 1;
        let second = connector.submit_settlement(&s).await.unwrap();
        assert_ne!(first.tx_hash, second.tx_hash);
    }

    #[tokio::test]
    async fn unknown_hash_is_reported() {
        let connector = connector(chain());
        let hash = TxHash::new([9; 32]);
        assert_eq!(
            connector.check_confirmation(&hash).await,
            Err(ConnectorError::UnknownTransaction(hash))
        );
    }
}
