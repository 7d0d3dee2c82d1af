//! Nullable connector: a network whose answers the test scripts.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use dualnet_settlement::{ConnectorError, NetworkConnector, Submission};
use dualnet_store::Settlement;
use dualnet_types::{NetworkKind, SettlementId, TxHash};

struct Script {
    submit_error: Option<ConnectorError>,
    confirm_immediately: bool,
    /// `None` never confirms.
    polls_until_confirmed: Option<u32>,
    poll_errors: u32,
    submitted: Vec<SettlementId>,
    polls: HashMap<TxHash, u32>,
}

/// By default accepts every submission and confirms on the first poll.
pub struct NullConnector {
    kind: NetworkKind,
    script: Mutex<Script>,
}

impl NullConnector {
    pub fn new(kind: NetworkKind) -> Self {
        Self {
            kind,
            script: Mutex::new(Script {
                submit_error: None,
                confirm_immediately: false,
                polls_until_confirmed: Some(1),
                poll_errors: 0,
                submitted: Vec::new(),
                polls: HashMap::new(),
            }),
        }
    }

    /// Reject every submission with `error`.
    pub fn failing(self, error: ConnectorError) -> Self {
        self.lock().submit_error = Some(error);
        self
    }

    /// Accept submissions again after [`NullConnector::failing`].
    pub fn recover(&self) {
        self.lock().submit_error = None;
    }

    /// Report submissions as already final.
    pub fn confirming_immediately(self) -> Self {
        self.lock().confirm_immediately = true;
        self
    }

    /// Confirm on the `polls`-th successful check of a hash.
    pub fn confirm_after(self, polls: u32) -> Self {
        self.lock().polls_until_confirmed = Some(polls.max(1));
        self
    }

    pub fn never_confirming(self) -> Self {
        self.lock().polls_until_confirmed = None;
        self
    }

    /// Fail the first `count` confirmation checks with `Unavailable`.
    pub fn with_poll_errors(self, count: u32) -> Self {
        self.lock().poll_errors = count;
        self
    }

    /// Start confirming from the next poll on.
    pub fn confirm_now(&self) {
        let mut script = self.lock();
        script.polls_until_confirmed = Some(1);
        script.polls.clear();
    }

    pub fn submitted(&self) -> Vec<SettlementId> {
        self.lock().submitted.clone()
    }

    /// Successful checks made against `tx_hash`.
    pub fn poll_count(&self, tx_hash: &TxHash) -> u32 {
        self.lock().polls.get(tx_hash).copied().unwrap_or(0)
    }

    /// The hash this connector reports for `id`.
    pub fn tx_hash_for(&self, id: SettlementId) -> TxHash {
        let mut data = vec![self.kind as u8];
        data.extend_from_slice(&id.raw().to_be_bytes());
        TxHash::new(dualnet_crypto::hash_domain(b"dualnet.null.settlement", &data))
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl NetworkConnector for NullConnector {
    fn kind(&self) -> NetworkKind {
        self.kind
    }

    async fn submit_settlement(&self, settlement: &Settlement) -> Result<Submission, ConnectorError> {
        let tx_hash = self.tx_hash_for(settlement.id);
        let mut script = self.lock();
        if let Some(error) = &script.submit_error {
            return Err(error.clone());
        }
        script.submitted.push(settlement.id);
        Ok(Submission {
            tx_hash,
            confirmed: script.confirm_immediately,
        })
    }

    async fn check_confirmation(&self, tx_hash: &TxHash) -> Result<bool, ConnectorError> {
        let mut script = self.lock();
        if script.poll_errors > 0 {
            script.poll_errors -= 1;
            return Err(ConnectorError::Unavailable("scripted outage".into()));
        }
        let polls = script.polls.entry(*tx_hash).or_insert(0);
        *polls += 1;
        let polls = *polls;
        Ok(script.polls_until_confirmed.is_some_and(|target| polls >= target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualnet_store::NewSettlement;
    use dualnet_types::{Amount, CurrencyPair, Timestamp};

    fn settlement(id: u64) -> Settlement {
        Settlement::new(
            SettlementId::new(id),
            NewSettlement {
                batch_ref: "b".into(),
                total: Amount::new(1),
                currency: CurrencyPair::new("USD", "EUR"),
                network: NetworkKind::Chain,
            },
            Timestamp::new(0),
        )
    }

    #[tokio::test]
    async fn confirms_after_scripted_polls() {
        let connector = NullConnector::new(NetworkKind::Chain).confirm_after(3).with_poll_errors(1);
        let sub = connector.submit_settlement(&settlement(1)).await.unwrap();
        assert!(!sub.confirmed);
        assert!(connector.check_confirmation(&sub.tx_hash).await.is_err());
        assert!(!connector.check_confirmation(&sub.tx_hash).await.unwrap());
        assert!(!connector.check_confirmation(&sub.tx_hash).await.unwrap());
        assert!(connector.check_confirmation(&sub.tx_hash).await.unwrap());
        assert_eq!(connector.poll_count(&sub.tx_hash), 3);
    }

    #[tokio::test]
    async fn failing_connector_records_nothing() {
        let connector =
            NullConnector::new(NetworkKind::Sharded).failing(ConnectorError::Rejected("no".into()));
        assert!(connector.submit_settlement(&settlement(1)).await.is_err());
        assert!(connector.submitted().is_empty());

        connector.recover();
        assert!(connector.submit_settlement(&settlement(2)).await.is_ok());
        assert_eq!(connector.submitted(), vec![SettlementId::new(2)]);
    }
}
