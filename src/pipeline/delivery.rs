//! Delivery pipeline - bounded queue drained by exactly one worker.
//!
//! Lifecycle: [`new`](DeliveryPipeline::new) → [`start`](DeliveryPipeline::start)
//! → [`enqueue`](DeliveryPipeline::enqueue) (any number of batches) →
//! [`wait`](DeliveryPipeline::wait) → [`close`](DeliveryPipeline::close) →
//! [`join`](DeliveryPipeline::join).
//!
//! Every enqueued fact is handed to the sink exactly once. Failures are
//! logged and counted, never retried, and never hold up `wait`. A sink that
//! panics is recorded as a failed attempt and the worker moves on.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::latch::CompletionLatch;
use super::outcome::{DeliveryCounters, DeliveryOutcome, DeliveryStats};
use crate::transport::{FactSink, TransportError};
use crate::types::Fact;

/// Pipeline usage errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,
    #[error("delivery worker already started")]
    AlreadyStarted,
    #[error("pipeline is closed to new facts")]
    Closed,
    #[error("pipeline already closed")]
    AlreadyClosed,
    #[error("pipeline must be closed before joining the worker")]
    NotClosed,
    #[error("delivery worker stopped with {undelivered} facts not enqueued")]
    WorkerStopped { undelivered: usize },
    #[error("delivery worker panicked: {0}")]
    WorkerPanicked(String),
    #[error("delivery worker was cancelled before the queue drained")]
    WorkerCancelled,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct DeliveryPipeline {
    sink: Arc<dyn FactSink>,
    capacity: usize,
    /// `None` once closed.
    sender: Mutex<Option<mpsc::Sender<Fact>>>,
    /// Handed to the single worker by `start`.
    receiver: Mutex<Option<mpsc::Receiver<Fact>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    latch: Arc<CompletionLatch>,
    counters: Arc<DeliveryCounters>,
    outcomes: Option<mpsc::UnboundedSender<DeliveryOutcome>>,
}

impl DeliveryPipeline {
    /// Create a pipeline with an empty queue of `capacity` slots.
    ///
    /// No worker runs until [`start`](Self::start) is called.
    pub fn new(sink: Arc<dyn FactSink>, capacity: usize) -> Result<Self, PipelineError> {
        if capacity == 0 {
            return Err(PipelineError::ZeroCapacity);
        }
        let (tx, rx) = mpsc::channel(capacity);
        Ok(Self {
            sink,
            capacity,
            sender: Mutex::new(Some(tx)),
            receiver: Mutex::new(Some(rx)),
            worker: Mutex::new(None),
            latch: Arc::new(CompletionLatch::new()),
            counters: Arc::new(DeliveryCounters::default()),
            outcomes: None,
        })
    }

    /// Publish one [`DeliveryOutcome`] per attempted fact on the returned
    /// receiver.
    ///
    /// Outcomes are sent before the fact is released from the completion
    /// latch, so after `wait()` every outcome so far is already queued. The
    /// channel is unbounded and a dropped receiver is ignored, so reporting
    /// never stalls delivery.
    pub fn with_outcomes(mut self) -> (Self, mpsc::UnboundedReceiver<DeliveryOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outcomes = Some(tx);
        (self, rx)
    }

    /// Spawn the consuming worker on the current tokio runtime.
    ///
    /// There is exactly one worker per pipeline; a second call returns
    /// [`PipelineError::AlreadyStarted`].
    pub fn start(&self) -> Result<(), PipelineError> {
        let rx = lock(&self.receiver)
            .take()
            .ok_or(PipelineError::AlreadyStarted)?;
        let queue = WorkerQueue {
            rx,
            latch: Arc::clone(&self.latch),
            counters: Arc::clone(&self.counters),
            in_flight: false,
        };

        let worker = Worker {
            sink: Arc::clone(&self.sink),
            latch: Arc::clone(&self.latch),
            counters: Arc::clone(&self.counters),
            outcomes: self.outcomes.clone(),
        };
        let handle = tokio::spawn(worker.run(queue));
        *lock(&self.worker) = Some(handle);

        debug!(capacity = self.capacity, "Delivery worker started");
        Ok(())
    }

    /// Register a batch and push it onto the queue in order.
    ///
    /// The whole batch is counted by the completion latch before the first
    /// fact becomes visible to the worker. Suspends while the queue is full.
    pub async fn enqueue<I>(&self, facts: I) -> Result<(), PipelineError>
    where
        I: IntoIterator<Item = Fact>,
        I::IntoIter: ExactSizeIterator,
    {
        let tx = lock(&self.sender).clone().ok_or(PipelineError::Closed)?;
        let facts = facts.into_iter();
        let total = facts.len();

        self.latch.add(total);
        self.counters.record_enqueued(total as u64);

        for (pushed, fact) in facts.enumerate() {
            if tx.send(fact).await.is_err() {
                let undelivered = total - pushed;
                self.latch.release(undelivered);
                self.counters.retract_enqueued(undelivered as u64);
                warn!(undelivered, "Delivery worker gone, batch cut short");
                return Err(PipelineError::WorkerStopped { undelivered });
            }
        }

        debug!(count = total, "Batch enqueued");
        Ok(())
    }

    /// Wait until every fact enqueued so far has been attempted.
    pub async fn wait(&self) {
        self.latch.wait().await;
    }

    /// Close the queue to further pushes.
    ///
    /// Only call once every producer has finished enqueuing. Facts already
    /// queued are still delivered; the worker exits when the queue is empty.
    pub fn close(&self) -> Result<(), PipelineError> {
        lock(&self.sender)
            .take()
            .map(drop)
            .ok_or(PipelineError::AlreadyClosed)?;
        info!(outstanding = self.latch.outstanding(), "Delivery queue closed");
        Ok(())
    }

    /// Wait for the worker to exit after [`close`](Self::close).
    ///
    /// Returns immediately if the worker was never started or was already
    /// joined.
    pub async fn join(&self) -> Result<(), PipelineError> {
        if !self.is_closed() {
            return Err(PipelineError::NotClosed);
        }
        let handle = lock(&self.worker).take();
        match handle {
            Some(handle) => handle.await.map_err(|e| {
                if e.is_panic() {
                    PipelineError::WorkerPanicked(e.to_string())
                } else {
                    PipelineError::WorkerCancelled
                }
            }),
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.sender).is_none()
    }

    /// Facts enqueued but not yet attempted.
    pub fn outstanding(&self) -> usize {
        self.latch.outstanding()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> DeliveryStats {
        self.counters.snapshot()
    }
}

// ============================================================================
// Worker
// ============================================================================

struct Worker {
    sink: Arc<dyn FactSink>,
    latch: Arc<CompletionLatch>,
    counters: Arc<DeliveryCounters>,
    outcomes: Option<mpsc::UnboundedSender<DeliveryOutcome>>,
}

impl Worker {
    async fn run(self, mut queue: WorkerQueue) {
        while let Some(fact) = queue.rx.recv().await {
            queue.in_flight = true;
            let result = match AssertUnwindSafe(self.sink.send(&fact)).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(TransportError::Panicked(panic_message(payload.as_ref()))),
            };
            if let Err(e) = &result {
                warn!(error = %e, fact = %fact, "Error sending fact");
            }
            self.counters.record_result(&result);

            if let Some(outcomes) = &self.outcomes {
                // Receiver may be gone; delivery carries on regardless.
                let _ = outcomes.send(DeliveryOutcome { fact, result });
            }
            self.latch.done();
            queue.in_flight = false;
        }

        let stats = self.counters.snapshot();
        info!(
            delivered = stats.delivered,
            failed = stats.failed,
            "Delivery worker stopped"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

/// Receiving end owned by the worker task.
///
/// If the task is torn down before the queue drains (runtime shutdown,
/// abort), dropping this closes the queue and releases every fact that will
/// now never be attempted, so `wait()` cannot hang on them and producers get
/// [`PipelineError::WorkerStopped`] instead of blocking.
struct WorkerQueue {
    rx: mpsc::Receiver<Fact>,
    latch: Arc<CompletionLatch>,
    counters: Arc<DeliveryCounters>,
    /// A fact has been taken off the queue but not yet released.
    in_flight: bool,
}

impl Drop for WorkerQueue {
    fn drop(&mut self) {
        self.rx.close();
        let mut abandoned = usize::from(self.in_flight);
        while self.rx.try_recv().is_ok() {
            abandoned += 1;
        }
        if abandoned > 0 {
            warn!(abandoned, "Delivery worker torn down with facts still queued");
            self.counters.retract_enqueued(abandoned as u64);
            self.latch.release(abandoned);
        }
    }
}
