use std::sync::Arc;

use dualnet_types::{Amount, NetworkKind};

use crate::NetworkConnector;

/// Chooses a network for a settlement by its total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Router {
    chain_threshold: Amount,
}

impl Router {
    pub fn new(chain_threshold: Amount) -> Self {
        Self { chain_threshold }
    }

    /// Totals strictly above the threshold use the single-chain network.
    pub fn route(&self, total: Amount) -> NetworkKind {
        if total > self.chain_threshold {
            NetworkKind::Chain
        } else {
            NetworkKind::Sharded
        }
    }
}

/// One connector per network.
#[derive(Clone)]
pub struct Connectors {
    sharded: Arc<dyn NetworkConnector>,
    chain: Arc<dyn NetworkConnector>,
}

impl Connectors {
    pub fn new(sharded: Arc<dyn NetworkConnector>, chain: Arc<dyn NetworkConnector>) -> Self {
        Self { sharded, chain }
    }

    pub fn get(&self, kind: NetworkKind) -> &Arc<dyn NetworkConnector> {
        match kind {
            NetworkKind::Sharded => &self.sharded,
            NetworkKind::Chain => &self.chain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_exclusive() {
        let router = Router::new(Amount::new(1_000));
        assert_eq!(router.route(Amount::new(999)), NetworkKind::Sharded);
        assert_eq!(router.route(Amount::new(1_000)), NetworkKind::Sharded);
        assert_eq!(router.route(Amount::new(1_001)), NetworkKind::Chain);
    }
}
