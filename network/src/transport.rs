//! Point-to-point and flood delivery over a [`PeerRegistry`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{NetworkError, NetworkMessage, PeerRegistry};

/// Outcome of a broadcast.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadcastResult {
    /// Peers the envelope was queued for.
    pub sent: usize,
    /// Peers whose inbox was full or closed.
    pub failed: usize,
}

/// A node's handle for sending envelopes to other registered peers.
#[derive(Clone)]
pub struct LocalTransport {
    local_id: String,
    registry: Arc<PeerRegistry>,
}

impl LocalTransport {
    pub fn new(local_id: impl Into<String>, registry: Arc<PeerRegistry>) -> Self {
        Self {
            local_id: local_id.into(),
            registry,
        }
    }

    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    /// Queue `msg` for one peer without waiting.
    pub fn send(&self, to: &str, msg: &NetworkMessage) -> Result<(), NetworkError> {
        let sender = self
            .registry
            .sender(to)
            .ok_or_else(|| NetworkError::PeerNotFound(to.to_string()))?;
        let bytes = msg.to_bytes()?;
        sender
            .try_send(bytes)
            .map_err(|_| NetworkError::Unreachable(to.to_string()))
    }

    /// Queue `msg` for every registered peer except this one.
    pub fn broadcast(&self, msg: &NetworkMessage) -> Result<BroadcastResult, NetworkError> {
        let bytes = msg.to_bytes()?;
        let mut result = BroadcastResult::default();
        for peer in self.registry.peers() {
            if peer == self.local_id {
                continue;
            }
            let Some(sender) = self.registry.sender(&peer) else {
                continue;
            };
            match sender.try_send(bytes.clone()) {
                Ok(()) => result.sent += 1,
                Err(_) => {
                    warn!(peer = %peer, topic = ?msg.topic, "broadcast dropped");
                    result.failed += 1;
                }
            }
        }
        debug!(from = %self.local_id, topic = ?msg.topic, sent = result.sent, "broadcast");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Topic;

    #[tokio::test]
    async fn send_reaches_named_peer() {
        let registry = Arc::new(PeerRegistry::new());
        let mut inbox = registry.register("b", 8).unwrap();
        let transport = LocalTransport::new("a", registry);

        let msg = NetworkMessage::wrap("a", Topic::Transaction, &42u32).unwrap();
        transport.send("b", &msg).unwrap();

        let got = inbox.recv().await.unwrap().unwrap();
        assert_eq!(got.from, "a");
        assert_eq!(got.open::<u32>().unwrap(), 42);
    }

    #[test]
    fn send_to_unknown_peer_fails() {
        let transport = LocalTransport::new("a", Arc::new(PeerRegistry::new()));
        let msg = NetworkMessage::wrap("a", Topic::Block, &1u8).unwrap();
        assert!(matches!(transport.send("zz", &msg), Err(NetworkError::PeerNotFound(_))));
    }

    #[tokio::test]
    async fn broadcast_skips_self_and_counts_full_inboxes() {
        let registry = Arc::new(PeerRegistry::new());
        let mut own = registry.register("a", 4).unwrap();
        let mut b = registry.register("b", 4).unwrap();
        let _c = registry.register("c", 1).unwrap();
        let transport = LocalTransport::new("a", registry);

        let first = NetworkMessage::wrap("a", Topic::Block, &1u8).unwrap();
        let second = NetworkMessage::wrap("a", Topic::Block, &2u8).unwrap();
        assert_eq!(transport.broadcast(&first).unwrap(), BroadcastResult { sent: 2, failed: 0 });
        assert_eq!(transport.broadcast(&second).unwrap(), BroadcastResult { sent: 1, failed: 1 });

        assert!(own.try_recv().is_none());
        assert_eq!(b.recv().await.unwrap().unwrap().open::<u8>().unwrap(), 1);
        assert_eq!(b.recv().await.unwrap().unwrap().open::<u8>().unwrap(), 2);
    }

    #[tokio::test]
    async fn duplicate_envelopes_are_dropped() {
        let registry = Arc::new(PeerRegistry::new());
        let mut inbox = registry.register("b", 8).unwrap();
        let transport = LocalTransport::new("a", registry);

        let msg = NetworkMessage::wrap("a", Topic::MicroBlock, &9u16).unwrap();
        transport.send("b", &msg).unwrap();
        transport.send("b", &msg).unwrap();

        assert!(inbox.try_recv().is_some());
        assert!(inbox.try_recv().is_none());
    }
}
