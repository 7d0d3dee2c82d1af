//! Explicit peer table.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::mpsc;
use tracing::debug;

use crate::{MessageDedup, NetworkError, NetworkMessage};

/// Maps peer ids to the sending half of their inbox.
#[derive(Default)]
pub struct PeerRegistry {
    peers: RwLock<BTreeMap<String, mpsc::Sender<Vec<u8>>>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer with an inbox of `capacity` envelopes.
    pub fn register(&self, peer_id: impl Into<String>, capacity: usize) -> Result<PeerInbox, NetworkError> {
        let peer_id = peer_id.into();
        let mut peers = self.peers.write().unwrap_or_else(PoisonError::into_inner);
        if peers.contains_key(&peer_id) {
            return Err(NetworkError::DuplicatePeer(peer_id));
        }
        let (tx, rx) = mpsc::channel(capacity.max(1));
        peers.insert(peer_id.clone(), tx);
        debug!(peer = %peer_id, "peer registered");
        Ok(PeerInbox {
            peer_id,
            rx,
            dedup: MessageDedup::default(),
        })
    }

    pub fn unregister(&self, peer_id: &str) -> bool {
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(peer_id)
            .is_some()
    }

    pub(crate) fn sender(&self, peer_id: &str) -> Option<mpsc::Sender<Vec<u8>>> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(peer_id)
            .cloned()
    }

    /// Peer ids in lexicographic order.
    pub fn peers(&self) -> Vec<String> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receiving side of a registered peer. Duplicate envelopes are dropped.
pub struct PeerInbox {
    peer_id: String,
    rx: mpsc::Receiver<Vec<u8>>,
    dedup: MessageDedup,
}

impl PeerInbox {
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    /// Next fresh envelope, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Result<NetworkMessage, NetworkError>> {
        while let Some(bytes) = self.rx.recv().await {
            if let Some(msg) = self.accept(&bytes) {
                return Some(msg);
            }
        }
        None
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<Result<NetworkMessage, NetworkError>> {
        while let Ok(bytes) = self.rx.try_recv() {
            if let Some(msg) = self.accept(&bytes) {
                return Some(msg);
            }
        }
        None
    }

    fn accept(&mut self, bytes: &[u8]) -> Option<Result<NetworkMessage, NetworkError>> {
        if self.dedup.check(bytes) {
            debug!(peer = %self.peer_id, "duplicate envelope dropped");
            return None;
        }
        Some(NetworkMessage::from_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_rejected() {
        let registry = PeerRegistry::new();
        let _inbox = registry.register("a", 4).unwrap();
        assert!(matches!(registry.register("a", 4), Err(NetworkError::DuplicatePeer(_))));
        assert_eq!(registry.peers(), vec!["a".to_string()]);
    }

    #[test]
    fn unregister_removes_peer() {
        let registry = PeerRegistry::new();
        let _inbox = registry.register("a", 4).unwrap();
        assert!(registry.unregister("a"));
        assert!(!registry.unregister("a"));
        assert!(registry.is_empty());
    }
}
