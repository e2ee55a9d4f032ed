//! Per-connection generation registry.
//!
//! [`GenerationRegistry`] owns the mapping from [`ConnectionId`] to that
//! connection's generation state: whether a production timer is scheduled,
//! how many candidates the current run produced, and the timer task itself.
//!
//! # Concurrency
//!
//! The map is a sharded [`DashMap`] of `Arc<tokio::sync::Mutex<_>>` slots.
//! Map guards are only held long enough to clone a slot handle, never
//! across an `.await`, so thousands of connections proceed independently.
//! Every operation on one connection serializes on that connection's mutex.
//!
//! Each `start` begins a new *run* and bumps a per-slot run epoch; `stop`,
//! `cleanup` and tick failure bump it again. A tick re-checks the epoch
//! after its store call returns, under the lock, before it counts or emits
//! anything. A tick that straddles a `stop` therefore discards its result,
//! and once `stop` returns nothing more is emitted for that run.
//!
//! The store call happens outside the lock, so a slow store never delays
//! `stop`, `status`, or any other connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use election_types::{Candidate, ConnectionId, GenerationStats, GenerationStatus};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::factory;
use crate::store::CandidateStore;

/// Errors returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// [`GenerationRegistry::shutdown`] has begun; no new runs start.
    #[error("generation registry is shutting down")]
    ShuttingDown,
}

/// Result of one production tick, handed to the [`GenerationSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// A candidate was stored and counted.
    Produced {
        /// The connection whose run produced it.
        connection: ConnectionId,
        /// The stored candidate.
        candidate: Candidate,
        /// The connection's count including this candidate.
        produced_count: u64,
    },
    /// The store rejected the candidate; the run has ended.
    Failed {
        /// The connection whose run ended.
        connection: ConnectionId,
        /// Count retained from the successful ticks of the run.
        produced_count: u64,
        /// The store's error message.
        reason: String,
    },
}

impl GenerationOutcome {
    /// The connection the outcome belongs to.
    pub const fn connection(&self) -> ConnectionId {
        match self {
            Self::Produced { connection, .. } | Self::Failed { connection, .. } => *connection,
        }
    }
}

/// Receiver of tick outcomes.
///
/// Called while the originating connection's lock is held, which is what
/// keeps one connection's outcomes in tick order. Implementations must not
/// block or call back into the registry.
pub trait GenerationSink: Send + Sync {
    /// Deliver one outcome.
    fn deliver(&self, outcome: GenerationOutcome);
}

/// Mutable state of one connection.
#[derive(Debug, Default)]
struct GenerationState {
    active: bool,
    produced_count: u64,
    /// Bumped whenever a run begins or ends.
    run: u64,
    /// Set by `cleanup`; the slot is no longer in the map.
    retired: bool,
    timer: Option<JoinHandle<()>>,
}

impl GenerationState {
    const fn status(&self) -> GenerationStatus {
        GenerationStatus {
            is_generating: self.active,
            generated_count: self.produced_count,
        }
    }

    const fn is_current(&self, run: u64) -> bool {
        self.active && !self.retired && self.run == run
    }

    /// Cancel the timer and end the current run. Keeps the count.
    fn halt(&mut self) {
        self.active = false;
        self.run = self.run.wrapping_add(1);
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

type Slot = Arc<Mutex<GenerationState>>;

struct Inner {
    slots: DashMap<ConnectionId, Slot>,
    store: Arc<dyn CandidateStore>,
    sink: Arc<dyn GenerationSink>,
    period: Duration,
    shutting_down: AtomicBool,
}

/// Owner of every connection's generation state.
///
/// Cheap to clone; clones share the same map.
#[derive(Clone)]
pub struct GenerationRegistry {
    inner: Arc<Inner>,
}

impl core::fmt::Debug for GenerationRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GenerationRegistry")
            .field("connections", &self.inner.slots.len())
            .field("period", &self.inner.period)
            .field("shutting_down", &self.is_shutting_down())
            .finish_non_exhaustive()
    }
}

impl GenerationRegistry {
    /// Create a registry that ticks every `period`, persists through
    /// `store`, and reports tick outcomes to `sink`.
    pub fn new(
        store: Arc<dyn CandidateStore>,
        sink: Arc<dyn GenerationSink>,
        period: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: DashMap::new(),
                store,
                sink,
                period,
                shutting_down: AtomicBool::new(false),
            }),
        }
    }

    /// The tick period.
    pub fn period(&self) -> Duration {
        self.inner.period
    }

    /// Begin a fresh run for `id`, stopping any run already active.
    ///
    /// The count resets to zero and the first tick fires one period from
    /// now. Returns the status right after starting.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ShuttingDown`] once [`shutdown`](Self::shutdown)
    /// has begun.
    pub async fn start(&self, id: ConnectionId) -> Result<GenerationStatus, RegistryError> {
        loop {
            if self.is_shutting_down() {
                return Err(RegistryError::ShuttingDown);
            }

            let slot = self.slot_or_insert(id);
            let mut state = slot.lock().await;
            // Shutdown may have snapshotted the map while this start waited.
            if self.is_shutting_down() {
                return Err(RegistryError::ShuttingDown);
            }
            if state.retired {
                // Lost a race with cleanup; the map now holds a fresh slot
                // (or none), so look again.
                continue;
            }

            let restarted = state.active;
            state.halt();
            state.active = true;
            state.produced_count = 0;
            let run = state.run;
            state.timer = Some(self.spawn_timer(id, Arc::clone(&slot), run));

            info!(
                connection = %id,
                restarted,
                period_ms = u64::try_from(self.inner.period.as_millis()).unwrap_or(u64::MAX),
                "generation started"
            );
            return Ok(state.status());
        }
    }

    /// Stop `id`'s run, keeping its count.
    ///
    /// A no-op for unknown or already-stopped connections. Once this
    /// returns, no further outcome is emitted for the stopped run.
    pub async fn stop(&self, id: ConnectionId) -> GenerationStatus {
        let Some(slot) = self.slot(id) else {
            return GenerationStatus::IDLE;
        };
        let mut state = slot.lock().await;
        if state.active {
            state.halt();
            info!(
                connection = %id,
                produced = state.produced_count,
                "generation stopped"
            );
        }
        state.status()
    }

    /// Current status of `id`; idle with a zero count if unknown.
    pub async fn status(&self, id: ConnectionId) -> GenerationStatus {
        match self.slot(id) {
            Some(slot) => slot.lock().await.status(),
            None => GenerationStatus::IDLE,
        }
    }

    /// Cancel `id`'s timer and forget all of its state. Idempotent.
    pub async fn cleanup(&self, id: ConnectionId) {
        let Some((_, slot)) = self.inner.slots.remove(&id) else {
            return;
        };
        let mut state = slot.lock().await;
        let was_active = state.active;
        state.halt();
        state.retired = true;
        debug!(connection = %id, was_active, "generation state removed");
    }

    /// Refuse new runs and clean up every known connection.
    ///
    /// Returns how many connections were cleaned up.
    pub async fn shutdown(&self) -> usize {
        self.inner.shutting_down.store(true, Ordering::Release);
        let ids = self.connection_ids();
        for id in &ids {
            self.cleanup(*id).await;
        }
        info!(cleaned = ids.len(), "generation registry shut down");
        ids.len()
    }

    /// Whether [`shutdown`](Self::shutdown) has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::Acquire)
    }

    /// Aggregate figures over every tracked connection.
    pub async fn stats(&self) -> GenerationStats {
        let slots: Vec<Slot> = self
            .inner
            .slots
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut stats = GenerationStats::default();
        for slot in slots {
            let state = slot.lock().await;
            if state.active {
                stats.active_generations = stats.active_generations.saturating_add(1);
            }
            stats.total_generated = stats.total_generated.saturating_add(state.produced_count);
        }
        stats
    }

    /// Connections that currently have state.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.inner.slots.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of connections that currently have state.
    pub fn connection_count(&self) -> usize {
        self.inner.slots.len()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn slot(&self, id: ConnectionId) -> Option<Slot> {
        self.inner.slots.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    fn slot_or_insert(&self, id: ConnectionId) -> Slot {
        Arc::clone(self.inner.slots.entry(id).or_default().value())
    }

    fn spawn_timer(&self, id: ConnectionId, slot: Slot, run: u64) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let period = inner.period;
            let first = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
            let mut interval = tokio::time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !inner.tick(id, &slot, run).await {
                    break;
                }
            }
        })
    }
}

impl Inner {
    /// One production cycle. Returns whether the run continues.
    async fn tick(&self, id: ConnectionId, slot: &Slot, run: u64) -> bool {
        if !slot.lock().await.is_current(run) {
            return false;
        }

        let draft = factory::random_candidate();
        let result = self.store.create(draft).await;

        let mut state = slot.lock().await;
        if !state.is_current(run) {
            debug!(connection = %id, "run ended during store call, discarding tick");
            return false;
        }

        match result {
            Ok(candidate) => {
                state.produced_count = state.produced_count.saturating_add(1);
                debug!(
                    connection = %id,
                    candidate = %candidate.name,
                    produced = state.produced_count,
                    "candidate generated"
                );
                self.sink.deliver(GenerationOutcome::Produced {
                    connection: id,
                    candidate,
                    produced_count: state.produced_count,
                });
                true
            }
            Err(e) => {
                warn!(
                    connection = %id,
                    error = %e,
                    produced = state.produced_count,
                    "candidate store failed, stopping generation"
                );
                state.halt();
                self.sink.deliver(GenerationOutcome::Failed {
                    connection: id,
                    produced_count: state.produced_count,
                    reason: e.to_string(),
                });
                false
            }
        }
    }
}
