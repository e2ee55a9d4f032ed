//! Glue between connections and the generation registry.
//!
//! The [`Coordinator`] turns inbound control messages into registry calls
//! and registry outcomes into outbound frames. It owns the
//! [`GenerationRegistry`] and shares a [`ConnectionHub`] with the
//! registry's sink ([`HubRelay`]), so ticks publish straight to peers.

use std::sync::Arc;
use std::time::Duration;

use election_core::config::GenerationConfig;
use election_core::registry::{GenerationOutcome, GenerationRegistry, GenerationSink};
use election_core::store::CandidateStore;
use election_types::{
    CandidateGenerated, ClientMessage, Connected, ConnectionId, GenerationError, GenerationStarted,
    GenerationStatusNotice, GenerationStopped, ServerMessage,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::hub::ConnectionHub;

const STARTED: &str = "Auto-generation started";
const STOPPED: &str = "Auto-generation stopped";
const START_FAILED: &str = "Failed to start generation";
const TICK_FAILED: &str = "Auto-generation stopped due to error";

/// Aggregate figures served by `GET /api/generation/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStats {
    /// Connections with a run in progress.
    pub active_generations: u64,
    /// Sum of every tracked connection's count.
    pub total_generated: u64,
    /// Sockets currently connected.
    pub connected_clients: usize,
}

/// Publishes registry outcomes to connected peers.
#[derive(Debug)]
pub struct HubRelay {
    hub: Arc<ConnectionHub>,
}

impl HubRelay {
    /// Relay into `hub`.
    pub const fn new(hub: Arc<ConnectionHub>) -> Self {
        Self { hub }
    }
}

impl GenerationSink for HubRelay {
    fn deliver(&self, outcome: GenerationOutcome) {
        match outcome {
            GenerationOutcome::Produced {
                connection,
                candidate,
                produced_count,
            } => {
                let frame = ServerMessage::CandidateGenerated(CandidateGenerated {
                    candidate,
                    generated_count: produced_count,
                    client_id: connection,
                });
                let peers = self.hub.broadcast(&frame);
                debug!(connection = %connection, produced_count, peers, "candidate broadcast");
            }
            GenerationOutcome::Failed {
                connection, reason, ..
            } => {
                let frame = ServerMessage::GenerationError(GenerationError {
                    message: TICK_FAILED.to_owned(),
                });
                if !self.hub.unicast(connection, frame) {
                    debug!(connection = %connection, %reason, "origin gone before error report");
                }
            }
        }
    }
}

/// Per-process generation coordinator.
///
/// Cheap to clone; clones share the hub and the registry.
#[derive(Debug, Clone)]
pub struct Coordinator {
    hub: Arc<ConnectionHub>,
    registry: GenerationRegistry,
}

impl Coordinator {
    /// Build a coordinator that ticks every `period` and queues up to
    /// `outbound_queue` frames per peer.
    pub fn new(store: Arc<dyn CandidateStore>, period: Duration, outbound_queue: usize) -> Self {
        let hub = Arc::new(ConnectionHub::new(outbound_queue));
        let relay = Arc::new(HubRelay::new(Arc::clone(&hub)));
        let registry = GenerationRegistry::new(store, relay, period);
        Self { hub, registry }
    }

    /// Build a coordinator from the `generation` config section.
    pub fn from_config(config: &GenerationConfig, store: Arc<dyn CandidateStore>) -> Self {
        Self::new(store, config.interval(), config.outbound_queue)
    }

    /// The peer set.
    pub const fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    /// The generation registry.
    pub const fn registry(&self) -> &GenerationRegistry {
        &self.registry
    }

    /// Accept a connection and greet it with its id.
    pub fn connect(&self) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
        let (id, rx) = self.hub.register();
        self.hub
            .unicast(id, ServerMessage::Connected(Connected { client_id: id }));
        info!(connection = %id, peers = self.hub.len(), "client connected");
        (id, rx)
    }

    /// Act on one control message from `id`.
    pub async fn handle(&self, id: ConnectionId, message: ClientMessage) {
        if !self.hub.contains(id) {
            debug!(connection = %id, %message, "message from unknown connection ignored");
            return;
        }
        debug!(connection = %id, %message, "control message");

        match message {
            ClientMessage::StartGeneration => match self.registry.start(id).await {
                Ok(status) => {
                    self.hub.unicast(
                        id,
                        ServerMessage::GenerationStarted(GenerationStarted {
                            message: STARTED.to_owned(),
                            generated_count: status.generated_count,
                        }),
                    );
                    self.announce(id, true);
                }
                Err(e) => {
                    warn!(connection = %id, error = %e, "generation start refused");
                    self.hub.unicast(
                        id,
                        ServerMessage::GenerationError(GenerationError {
                            message: START_FAILED.to_owned(),
                        }),
                    );
                }
            },
            ClientMessage::StopGeneration => {
                let status = self.registry.stop(id).await;
                self.hub.unicast(
                    id,
                    ServerMessage::GenerationStopped(GenerationStopped {
                        message: STOPPED.to_owned(),
                        total_generated: status.generated_count,
                    }),
                );
                self.announce(id, false);
            }
            ClientMessage::GetGenerationStatus => {
                let status = self.registry.status(id).await;
                self.hub
                    .unicast(id, ServerMessage::GenerationStatusResponse(status));
            }
        }
    }

    /// Tear down everything held for `id`. Safe to call more than once.
    pub async fn disconnect(&self, id: ConnectionId) {
        self.registry.cleanup(id).await;
        self.hub.unregister(id);
        info!(connection = %id, peers = self.hub.len(), "client disconnected");
    }

    /// Stop every run, refuse new ones, and close every peer queue.
    ///
    /// Returns how many connections had generation state.
    pub async fn shutdown(&self) -> usize {
        let stopped = self.registry.shutdown().await;
        let closed = self.hub.close_all();
        info!(stopped, closed, "coordinator shut down");
        stopped
    }

    /// Registry figures plus the live connection count.
    pub async fn stats(&self) -> LiveStats {
        let stats = self.registry.stats().await;
        LiveStats {
            active_generations: stats.active_generations,
            total_generated: stats.total_generated,
            connected_clients: self.hub.len(),
        }
    }

    fn announce(&self, id: ConnectionId, is_generating: bool) {
        self.hub
            .broadcast(&ServerMessage::GenerationStatus(GenerationStatusNotice {
                is_generating,
                client_id: id,
            }));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use election_core::store::{MemoryStore, StoreError};
    use election_types::{Candidate, CandidateDraft, GenerationStatus};

    use super::*;

    const PERIOD: Duration = Duration::from_secs(5);

    struct BrokenStore;

    #[async_trait]
    impl CandidateStore for BrokenStore {
        async fn create(&self, _draft: CandidateDraft) -> Result<Candidate, StoreError> {
            Err(StoreError::Unavailable(String::from("offline")))
        }

        async fn count(&self) -> Result<usize, StoreError> {
            Ok(0)
        }
    }

    fn coordinator() -> Coordinator {
        Coordinator::new(Arc::new(MemoryStore::new()), PERIOD, 64)
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    fn events(frames: &[ServerMessage]) -> Vec<&'static str> {
        frames.iter().map(ServerMessage::event_name).collect()
    }

    async fn wait_ticks(n: u32) {
        tokio::time::sleep(PERIOD * n + Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn connect_greets_with_client_id() {
        let coordinator = coordinator();
        let (id, mut rx) = coordinator.connect();
        assert_eq!(
            drain(&mut rx),
            vec![ServerMessage::Connected(Connected { client_id: id })]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn start_acknowledges_origin_and_notifies_everyone() {
        let coordinator = coordinator();
        let (a, mut rx_a) = coordinator.connect();
        let (_, mut rx_b) = coordinator.connect();
        drain(&mut rx_a);
        drain(&mut rx_b);

        coordinator.handle(a, ClientMessage::StartGeneration).await;

        let to_a = drain(&mut rx_a);
        assert_eq!(
            to_a.first(),
            Some(&ServerMessage::GenerationStarted(GenerationStarted {
                message: STARTED.to_owned(),
                generated_count: 0,
            }))
        );
        let notice = ServerMessage::GenerationStatus(GenerationStatusNotice {
            is_generating: true,
            client_id: a,
        });
        assert_eq!(to_a.get(1), Some(&notice));
        assert_eq!(drain(&mut rx_b), vec![notice]);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_are_broadcast_with_origin_and_count() {
        let coordinator = coordinator();
        let (a, mut rx_a) = coordinator.connect();
        let (_, mut rx_b) = coordinator.connect();
        coordinator.handle(a, ClientMessage::StartGeneration).await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        wait_ticks(3).await;

        for rx in [&mut rx_a, &mut rx_b] {
            let counts: Vec<u64> = drain(rx)
                .into_iter()
                .filter_map(|frame| match frame {
                    ServerMessage::CandidateGenerated(c) => {
                        assert_eq!(c.client_id, a);
                        Some(c.generated_count)
                    }
                    _ => None,
                })
                .collect();
            assert_eq!(counts, vec![1, 2, 3]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_reports_total_and_notifies_everyone() {
        let coordinator = coordinator();
        let (a, mut rx_a) = coordinator.connect();
        let (_, mut rx_b) = coordinator.connect();
        coordinator.handle(a, ClientMessage::StartGeneration).await;
        wait_ticks(2).await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        coordinator.handle(a, ClientMessage::StopGeneration).await;

        let to_a = drain(&mut rx_a);
        assert_eq!(
            to_a.first(),
            Some(&ServerMessage::GenerationStopped(GenerationStopped {
                message: STOPPED.to_owned(),
                total_generated: 2,
            }))
        );
        assert_eq!(events(&drain(&mut rx_b)), vec!["generation-status"]);

        wait_ticks(2).await;
        assert!(drain(&mut rx_b).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn status_request_answers_only_the_sender() {
        let coordinator = coordinator();
        let (a, mut rx_a) = coordinator.connect();
        let (_, mut rx_b) = coordinator.connect();
        coordinator.handle(a, ClientMessage::StartGeneration).await;
        wait_ticks(1).await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        coordinator.handle(a, ClientMessage::GetGenerationStatus).await;
        assert_eq!(
            drain(&mut rx_a),
            vec![ServerMessage::GenerationStatusResponse(GenerationStatus {
                is_generating: true,
                generated_count: 1,
            })]
        );
        assert!(drain(&mut rx_b).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn store_failure_is_reported_to_origin_only() {
        let coordinator = Coordinator::new(Arc::new(BrokenStore), PERIOD, 64);
        let (a, mut rx_a) = coordinator.connect();
        let (_, mut rx_b) = coordinator.connect();
        coordinator.handle(a, ClientMessage::StartGeneration).await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        wait_ticks(2).await;

        assert_eq!(
            drain(&mut rx_a),
            vec![ServerMessage::GenerationError(GenerationError {
                message: TICK_FAILED.to_owned(),
            })]
        );
        assert!(drain(&mut rx_b).is_empty());
        assert!(!coordinator.registry().status(a).await.is_generating);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_silences_the_departed_connection() {
        let coordinator = coordinator();
        let (a, mut rx_a) = coordinator.connect();
        let (_, mut rx_b) = coordinator.connect();
        coordinator.handle(a, ClientMessage::StartGeneration).await;
        wait_ticks(1).await;
        drain(&mut rx_b);

        coordinator.disconnect(a).await;
        coordinator.disconnect(a).await;

        wait_ticks(3).await;
        assert!(drain(&mut rx_b).is_empty());
        assert_eq!(coordinator.registry().connection_count(), 0);
        assert_eq!(coordinator.hub().len(), 1);
        // The departed peer's queue is closed once drained.
        drain(&mut rx_a);
        assert!(rx_a.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn messages_after_disconnect_are_ignored() {
        let coordinator = coordinator();
        let (a, _rx_a) = coordinator.connect();
        coordinator.disconnect(a).await;
        coordinator.handle(a, ClientMessage::StartGeneration).await;
        assert_eq!(coordinator.registry().connection_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_refuses_new_starts() {
        let coordinator = coordinator();
        let (a, _rx_a) = coordinator.connect();
        coordinator.handle(a, ClientMessage::StartGeneration).await;
        assert_eq!(coordinator.shutdown().await, 1);
        assert!(coordinator.hub().is_empty());

        let (b, mut rx_b) = coordinator.connect();
        drain(&mut rx_b);
        coordinator.handle(b, ClientMessage::StartGeneration).await;
        assert_eq!(
            drain(&mut rx_b),
            vec![ServerMessage::GenerationError(GenerationError {
                message: START_FAILED.to_owned(),
            })]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stats_include_connected_clients() {
        let coordinator = coordinator();
        let (a, _rx_a) = coordinator.connect();
        let (_b, _rx_b) = coordinator.connect();
        coordinator.handle(a, ClientMessage::StartGeneration).await;
        wait_ticks(2).await;

        assert_eq!(
            coordinator.stats().await,
            LiveStats {
                active_generations: 1,
                total_generated: 2,
                connected_clients: 2,
            }
        );
    }
}
