//! Main StageRelay server coordination.
//!
//! StageRelay owns the dispatcher and store, and keeps operational metrics.

use crate::config::Config;
use crate::dispatcher::{Dispatcher, Reply, Status};
use crate::error::Result;
use crate::storage::{EntryStore, MemoryStore, MonotonicIdGenerator};
use stage_types::Operation;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Operational metrics for monitoring relay activity.
///
/// All counters are monotonically increasing (reset only on restart).
/// Thread-safe via `AtomicU64`, no locks needed for incrementing.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Successful copy requests.
    pub copies_total: AtomicU64,
    /// Successful move requests.
    pub moves_total: AtomicU64,
    /// Successful paste requests.
    pub pastes_total: AtomicU64,
    /// Successful list requests.
    pub lists_total: AtomicU64,
    /// Move or paste requests whose target did not exist.
    pub not_found_total: AtomicU64,
    /// Requests that failed to open, decode, or verify.
    pub rejected_total: AtomicU64,
    /// Requests that failed inside the relay.
    pub errors_total: AtomicU64,
    /// Total sealed bytes received.
    pub bytes_received: AtomicU64,
    /// Total sealed bytes sent.
    pub bytes_sent: AtomicU64,
}

impl RelayMetrics {
    fn record(&self, op: Operation, received: usize, reply: &Reply) {
        self.bytes_received
            .fetch_add(received as u64, Ordering::Relaxed);
        self.bytes_sent
            .fetch_add(reply.body.len() as u64, Ordering::Relaxed);

        let counter = match (reply.status, op) {
            (Status::Success, Operation::Copy) => &self.copies_total,
            (Status::Success, Operation::Move) => &self.moves_total,
            (Status::Success, Operation::Paste) => &self.pastes_total,
            (Status::Success, Operation::List) => &self.lists_total,
            (Status::NotFound, _) => &self.not_found_total,
            (Status::BadRequest, _) => &self.rejected_total,
            (Status::InternalError, _) => &self.errors_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Main relay server.
#[derive(Debug)]
pub struct StageRelay {
    config: Config,
    dispatcher: Dispatcher,
    /// Operational metrics (counters).
    metrics: RelayMetrics,
    started: Instant,
}

impl StageRelay {
    /// Create a new StageRelay over the given store.
    pub fn new(config: Config, store: Arc<dyn EntryStore>) -> Self {
        let dispatcher = Dispatcher::new(
            config.keys.shared_key.clone(),
            config.keys.sign_public_key,
            store,
        );
        Self {
            config,
            dispatcher,
            metrics: RelayMetrics::default(),
            started: Instant::now(),
        }
    }

    /// Create a StageRelay with an in-memory store and wall-clock ids.
    ///
    /// # Errors
    ///
    /// Fails if the id generator cannot be seeded.
    pub fn from_config(config: Config) -> Result<Self> {
        let generator = MonotonicIdGenerator::new()?;
        let store = Arc::new(MemoryStore::new(generator));
        Ok(Self::new(config, store))
    }

    /// Get the relay configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get access to the entry store.
    pub fn store(&self) -> &Arc<dyn EntryStore> {
        self.dispatcher.store()
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// Time since the relay was created.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Dispatch one sealed request and record it.
    ///
    /// Blocks on the store lock; call from a blocking context.
    pub fn handle(&self, op: Operation, body: &[u8]) -> Reply {
        let reply = self.dispatcher.dispatch(op, body);
        self.metrics.record(op, body.len(), &reply);
        reply
    }
}
