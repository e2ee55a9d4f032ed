//! Connection hub: the set of live peers and their outbound queues.
//!
//! Each peer gets a bounded [`mpsc`] queue drained by its socket task.
//! Sends never wait: a peer whose queue is full (or whose socket task has
//! already gone) simply misses that frame, so one slow client cannot stall
//! a tick or another client.

use dashmap::DashMap;
use election_types::{ConnectionId, ServerMessage};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

/// Registry of connected peers keyed by [`ConnectionId`].
#[derive(Debug)]
pub struct ConnectionHub {
    peers: DashMap<ConnectionId, mpsc::Sender<ServerMessage>>,
    capacity: usize,
}

impl ConnectionHub {
    /// Create an empty hub whose per-peer queues hold `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            peers: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Accept a new peer. Returns its id and the receiving end of its
    /// outbound queue.
    pub fn register(&self) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(self.capacity);
        self.peers.insert(id, tx);
        debug!(connection = %id, peers = self.peers.len(), "peer registered");
        (id, rx)
    }

    /// Forget a peer. Returns whether it was known.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.peers.remove(&id).is_some();
        if removed {
            debug!(connection = %id, peers = self.peers.len(), "peer unregistered");
        }
        removed
    }

    /// Drop every peer's queue. Socket tasks see their queue close and
    /// end the connection.
    pub fn close_all(&self) -> usize {
        let closed = self.peers.len();
        self.peers.clear();
        closed
    }

    /// Offer `message` to every peer. Returns how many accepted it.
    pub fn broadcast(&self, message: &ServerMessage) -> usize {
        let mut delivered = 0_usize;
        for peer in &self.peers {
            if offer(*peer.key(), peer.value(), message.clone()) {
                delivered = delivered.saturating_add(1);
            }
        }
        delivered
    }

    /// Offer `message` to one peer. Unknown ids are ignored.
    pub fn unicast(&self, id: ConnectionId, message: ServerMessage) -> bool {
        self.peers
            .get(&id)
            .is_some_and(|peer| offer(id, peer.value(), message))
    }

    /// Ids of every connected peer.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.peers.iter().map(|peer| *peer.key()).collect()
    }

    /// Whether `id` is connected.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.peers.contains_key(&id)
    }

    /// Number of connected peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether no peer is connected.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

fn offer(id: ConnectionId, tx: &mpsc::Sender<ServerMessage>, message: ServerMessage) -> bool {
    let event = message.event_name();
    match tx.try_send(message) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            debug!(connection = %id, event, "outbound queue full, frame dropped");
            false
        }
        Err(TrySendError::Closed(_)) => {
            debug!(connection = %id, event, "peer gone, frame dropped");
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use election_types::GenerationError;

    use super::*;

    fn error_frame(text: &str) -> ServerMessage {
        ServerMessage::GenerationError(GenerationError {
            message: text.to_owned(),
        })
    }

    #[test]
    fn register_and_unregister() {
        let hub = ConnectionHub::new(4);
        assert!(hub.is_empty());
        let (a, _rx_a) = hub.register();
        let (b, _rx_b) = hub.register();
        assert_ne!(a, b);
        assert_eq!(hub.len(), 2);
        assert!(hub.contains(a));

        assert!(hub.unregister(a));
        assert!(!hub.unregister(a));
        assert_eq!(hub.connection_ids(), vec![b]);
    }

    #[test]
    fn broadcast_reaches_every_peer() {
        let hub = ConnectionHub::new(4);
        let (_, mut rx_a) = hub.register();
        let (_, mut rx_b) = hub.register();

        assert_eq!(hub.broadcast(&error_frame("x")), 2);
        assert_eq!(rx_a.try_recv().unwrap(), error_frame("x"));
        assert_eq!(rx_b.try_recv().unwrap(), error_frame("x"));
    }

    #[test]
    fn unicast_targets_one_peer_and_ignores_unknown_ids() {
        let hub = ConnectionHub::new(4);
        let (a, mut rx_a) = hub.register();
        let (_, mut rx_b) = hub.register();

        assert!(hub.unicast(a, error_frame("only a")));
        assert!(!hub.unicast(ConnectionId::new(), error_frame("nobody")));
        assert_eq!(rx_a.try_recv().unwrap(), error_frame("only a"));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn full_or_closed_peer_is_skipped() {
        let hub = ConnectionHub::new(1);
        let (_, mut slow) = hub.register();
        let (_, gone) = hub.register();
        let (_, mut healthy) = hub.register();
        drop(gone);

        assert_eq!(hub.broadcast(&error_frame("1")), 2);
        // `slow` has not drained its single slot yet.
        healthy.try_recv().unwrap();
        assert_eq!(hub.broadcast(&error_frame("2")), 1);
        assert_eq!(healthy.try_recv().unwrap(), error_frame("2"));
        assert_eq!(slow.try_recv().unwrap(), error_frame("1"));
        assert!(slow.try_recv().is_err());
    }

    #[test]
    fn close_all_ends_every_queue() {
        let hub = ConnectionHub::new(4);
        let (_, mut rx) = hub.register();
        assert_eq!(hub.close_all(), 1);
        assert!(hub.is_empty());
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
