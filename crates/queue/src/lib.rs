//! Write-coalescing operation queue
//!
//! Callers submit CREATE/UPDATE/DELETE intents against documents. Intents on
//! the same document collapse into one net operation, and the accumulated
//! batch is handed to a [`FlushHandler`] once submissions have been quiet for
//! the configured delay:
//!
//! ```ignore
//! let queue = OpQueue::builder()
//!     .flush_delay(500)
//!     .identifier("_id")
//!     .on_flush(|batch: Batch| write_downstream(batch))
//!     .build()?;
//!
//! queue.submit(OpKind::Create, doc, None)?;
//! ```

pub mod builder;
pub mod config;
pub mod scheduler;

pub use builder::OpQueueBuilder;
pub use config::{parse_log_level, FlushDelay, QueueConfig};
pub use opque_core::{
    ordered, Batch, Document, DocumentId, OpKind, PendingOperation, QueueError, Result,
};
pub use scheduler::FlushTimer;

use opque_core::CoalescingStore;
use parking_lot::Mutex;
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, Level};

/// Consumer of flushed batches
///
/// Called synchronously from the timer task (or from [`OpQueue::flush`]);
/// its outcome is not inspected. Long-running downstream writes should be
/// spawned from here rather than awaited.
pub trait FlushHandler: Send + Sync + 'static {
    fn on_flush(&self, batch: Batch);
}

impl<F> FlushHandler for F
where
    F: Fn(Batch) + Send + Sync + 'static,
{
    fn on_flush(&self, batch: Batch) {
        self(batch)
    }
}

/// Write-coalescing queue with a self-resetting flush delay
pub struct OpQueue {
    shared: Arc<Shared>,
    timer: FlushTimer,
    identifier: String,
}

/// State reachable from the timer task
struct Shared {
    state: Mutex<QueueState>,
    handler: Box<dyn FlushHandler>,
    log_level: LevelFilter,
}

struct QueueState {
    store: CoalescingStore,
    stopped: bool,
    /// Bumped on every accepted submission; a tick task only flushes the
    /// window it was armed for
    epoch: u64,
}

impl Shared {
    /// Swap out the buffer and hand it to the handler
    fn flush(&self) -> bool {
        let batch = self.state.lock().store.take();
        self.deliver(batch)
    }

    /// Timer expiry for the window armed at `epoch`
    ///
    /// Returns `None` without touching the buffer if a later submission has
    /// re-armed the timer in the meantime.
    fn flush_window(&self, epoch: u64) -> Option<bool> {
        let batch = {
            let mut state = self.state.lock();
            if state.epoch != epoch {
                return None;
            }
            state.store.take()
        };
        Some(self.deliver(batch))
    }

    fn deliver(&self, batch: Option<Batch>) -> bool {
        let Some(batch) = batch else {
            return false;
        };

        if Level::DEBUG <= self.log_level {
            debug!(entries = batch.len(), "flushing the queue");
        }

        let handler = &self.handler;
        if panic::catch_unwind(AssertUnwindSafe(|| handler.on_flush(batch))).is_err()
            && Level::ERROR <= self.log_level
        {
            error!("flush handler panicked, batch dropped");
        }

        true
    }
}

impl OpQueue {
    /// Start building a queue
    pub fn builder() -> OpQueueBuilder {
        OpQueueBuilder::new()
    }

    /// Build a queue from configuration and a handler
    pub fn from_config(config: QueueConfig, handler: impl FlushHandler) -> Result<Self> {
        OpQueueBuilder::from_config(config).on_flush(handler).build()
    }

    /// Arm a queue from validated settings
    pub(crate) fn start(
        flush_delay: Duration,
        identifier: String,
        log_level: LevelFilter,
        handler: Box<dyn FlushHandler>,
        runtime: Handle,
    ) -> Self {
        let store = CoalescingStore::new(identifier.clone()).with_log_level(log_level);
        let queue = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState {
                    store,
                    stopped: false,
                    epoch: 0,
                }),
                handler,
                log_level,
            }),
            timer: FlushTimer::new(flush_delay, runtime),
            identifier,
        };

        queue.reset_delay(0);

        if Level::INFO <= log_level {
            info!(
                flush_delay_ms = flush_delay.as_millis() as u64,
                identifier = %queue.identifier,
                "operation queue started"
            );
        }

        queue
    }

    /// Queue a write intent
    ///
    /// Applies the merge policy for the document's id and restarts the
    /// flush delay. Fails without touching the buffer if the document has
    /// no identifier or the queue was stopped.
    pub fn submit(
        &self,
        kind: OpKind,
        document: Document,
        metadata: Option<Value>,
    ) -> Result<DocumentId> {
        let mut state = self.shared.state.lock();
        if state.stopped {
            return Err(QueueError::Stopped);
        }
        let id = state.store.submit(kind, document, metadata)?;

        // Lock order is state, then timer. Tick tasks only ever take state.
        state.epoch = state.epoch.wrapping_add(1);
        self.reset_delay(state.epoch);
        Ok(id)
    }

    /// Queue a write intent whose kind is given by name
    ///
    /// Accepts `CREATE`, `UPDATE` and `DELETE`.
    pub fn submit_named(
        &self,
        operation: &str,
        document: Document,
        metadata: Option<Value>,
    ) -> Result<DocumentId> {
        let kind = operation.parse::<OpKind>()?;
        self.submit(kind, document, metadata)
    }

    /// Hand the buffered batch to the handler now
    ///
    /// Returns whether anything was delivered. Does not move the timer.
    pub fn flush(&self) -> bool {
        self.shared.flush()
    }

    /// Cancel the timer for good and return what was still buffered
    ///
    /// Later submissions fail with [`QueueError::Stopped`].
    pub fn stop(&self) -> Option<Batch> {
        let remaining = {
            let mut state = self.shared.state.lock();
            state.stopped = true;
            state.store.take()
        };
        self.timer.stop();

        if Level::INFO <= self.shared.log_level {
            info!(
                undelivered = remaining.as_ref().map_or(0, |batch| batch.len()),
                "operation queue stopped"
            );
        }

        remaining
    }

    fn reset_delay(&self, epoch: u64) {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        self.timer.reset(move || match shared.upgrade() {
            Some(shared) => shared.flush_window(epoch).is_some(),
            None => false,
        });
    }

    /// Pending operation for an id
    pub fn pending(&self, id: &str) -> Option<PendingOperation> {
        self.shared.state.lock().store.get(id).cloned()
    }

    /// Copy of the buffered batch
    pub fn snapshot(&self) -> Batch {
        self.shared.state.lock().store.pending().clone()
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().store.is_empty()
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.state.lock().stopped
    }

    pub fn flush_delay(&self) -> Duration {
        self.timer.period()
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}
